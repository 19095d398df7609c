use std::{error::Error, fmt::Display};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CipherError {
    /// 不支持的参数: 密钥长度, 公钥指数, 种子长度或辅助素数不满足FIPS 186-4的要求
    InvalidParameter(String),

    /// 随机搜索超过了迭代上限, 调用者应使用新的种子重试
    GenerationExhausted(String),

    /// RSA原语的输入不在`[0, n-1]`之内
    OutOfRange(String),

    /// 消息长度`real`超过了最大长度`max`
    MessageTooLong { max: usize, real: usize },

    /// MGF1的掩码长度`real`超过了`2^32 * hLen`
    MaskTooLong { max: u128, real: usize },

    InvalidPublicKey(String),

    InvalidPrivateKey(String),

    /// OAEP解密失败, 不区分具体原因
    DecryptionFailed,
}

impl CipherError {
    /// `true` when a fresh seed (or fresh randomness) may succeed where this call failed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::GenerationExhausted(_))
    }
}

impl Display for CipherError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidParameter(s) => write!(f, "invalid parameter: {s}"),
            Self::GenerationExhausted(s) => write!(f, "generation exhausted: {s}"),
            Self::OutOfRange(s) => f.write_str(s),
            Self::MessageTooLong { max, real } => f.write_fmt(format_args!(
                "message length `{real}` exceeds the maximum length `{max}`"
            )),
            Self::MaskTooLong { max, real } => f.write_fmt(format_args!(
                "mask length `{real}` exceeds the maximum length `{max}`"
            )),
            Self::InvalidPublicKey(s) | Self::InvalidPrivateKey(s) => f.write_str(s),
            Self::DecryptionFailed => f.write_str("decryption failed"),
        }
    }
}

impl Error for CipherError {}
