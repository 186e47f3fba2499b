// otp.rs
// Delivery-confirmation OTP generation.

use rand::Rng;

pub const OTP_MIN: u32 = 100_000;
pub const OTP_MAX: u32 = 999_999;

/// Generate a fresh 6-digit OTP, uniform over 100000..=999999.
/// Each invocation is independent; no reuse avoidance is attempted.
pub fn generate_otp() -> String {
    let mut rng = rand::rng(); // rand 0.9: thread-local RNG
    rng.random_range(OTP_MIN..=OTP_MAX).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn otp_is_six_decimal_digits_in_range() {
        for _ in 0..1000 {
            let otp = generate_otp();
            assert_eq!(otp.len(), 6);
            let value: u32 = otp.parse().expect("otp must be numeric");
            assert!((OTP_MIN..=OTP_MAX).contains(&value));
        }
    }

    #[test]
    fn consecutive_otps_vary() {
        // 1000 draws over a 900k space colliding every time is not credible.
        let first = generate_otp();
        let all_same = (0..1000).all(|_| generate_otp() == first);
        assert!(!all_same);
    }
}
