use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum JitterError {
    #[error("uniform jitter bounds are inverted: min {min} > max {max}")]
    InvertedBounds { min: f64, max: f64 },

    #[error("probability {0} is outside [0, 1]")]
    NotAProbability(f64),

    #[error("standard deviation {0} must be finite and non-negative")]
    InvalidStdDev(f64),

    #[error("log-normal mean {0} must be strictly positive")]
    NonPositiveMean(f64),

    #[error("jitter parameter `{0}` must be finite")]
    NonFinite(&'static str),
}

pub type JitterResult<T> = Result<T, JitterError>;
