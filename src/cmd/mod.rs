use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use cipher::CipherError;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use num_bigint::BigUint;
use num_traits::Num;

use crate::error::IfcError;

pub trait Cmd {
    const NAME: &'static str;

    fn cmd() -> Command;

    fn run(&self, m: &ArgMatches) -> anyhow::Result<()>;
}

pub mod config;
pub use config::IfcConfig;

mod seed;
pub use seed::SeedCmd;

mod primes;
pub use primes::PrimesCmd;

mod key;
pub use key::KeyCmd;

fn bits_arg() -> Arg {
    Arg::new("bits")
        .value_name("BITS")
        .action(ArgAction::Set)
        .required(false)
        .value_parser(value_parser!(usize))
        .help("to specify the modulus bits length, 1024/2048/3072, default from the config")
}

fn bits(m: &ArgMatches) -> usize {
    m.get_one::<usize>("bits")
        .copied()
        .unwrap_or(IfcConfig::config().bits)
}

fn parse_hex(s: &str) -> Result<BigUint, IfcError> {
    let x = s.trim();
    let x = x
        .strip_prefix("0x")
        .or_else(|| x.strip_prefix("0X"))
        .unwrap_or(x);
    BigUint::from_str_radix(x, 16).map_err(|_| IfcError::InvalidHex(s.to_string()))
}

/// Call `f` until it succeeds, at most `retries + 1` times. Only
/// [`CipherError::GenerationExhausted`] is retried, every call should draw a fresh seed.
fn with_retries<T, F>(retries: usize, mut f: F) -> anyhow::Result<T>
where
    F: FnMut(usize) -> Result<T, CipherError>,
{
    for attempt in 0..=retries {
        match f(attempt) {
            Ok(x) => return Ok(x),
            Err(e) if e.is_retryable() => {
                log::warn!("attempt {attempt}: {e}, retry with a fresh seed");
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(IfcError::RetriesExhausted(retries + 1).into())
}

fn write_to_file_or_stdout(m: &ArgMatches, data: &[u8]) -> anyhow::Result<()> {
    match m.get_one::<PathBuf>("output") {
        Some(p) => {
            let mut f = OpenOptions::new().create_new(true).write(true).open(p)?;
            f.write_all(data)?;
        }
        None => {
            let mut out = std::io::stdout().lock();
            out.write_all(data)?;
            out.write_all(b"\n")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{parse_hex, with_retries};
    use cipher::CipherError;
    use num_bigint::BigUint;

    #[test]
    fn hex() {
        assert_eq!(parse_hex("0xff").unwrap(), BigUint::from(255u32));
        assert_eq!(parse_hex(" 10001\n").unwrap(), BigUint::from(65537u32));
        assert!(parse_hex("xyz").is_err());
    }

    #[test]
    fn retries() {
        let mut calls = 0;
        let x = with_retries(3, |attempt| {
            calls += 1;
            if attempt < 2 {
                Err(CipherError::GenerationExhausted("exhausted".to_string()))
            } else {
                Ok(attempt)
            }
        })
        .unwrap();
        assert_eq!((x, calls), (2, 3));

        let mut calls = 0;
        let res: anyhow::Result<()> = with_retries(3, |_| {
            calls += 1;
            Err(CipherError::InvalidParameter("e".to_string()))
        });
        assert!(res.is_err());
        assert_eq!(calls, 1);

        let res: anyhow::Result<()> =
            with_retries(1, |_| Err(CipherError::GenerationExhausted("x".to_string())));
        assert!(res.unwrap_err().to_string().contains("2"));
    }
}
