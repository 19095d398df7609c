use crate::cmd::primes::{exponent, exponent_arg, generate_pair, method_arg};
use crate::cmd::{bits, bits_arg, write_to_file_or_stdout, Cmd};
use crate::error::IfcError;
use cipher::ifc::PrimeMethod;
use cipher::rsa::{OAEPDecrypt, PrivateKey};
use cipher::{CipherError, Decrypt, DefaultDigest, DefaultRand, Encrypt, Rand};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use num_bigint::BigUint;
use serde::Serialize;
use std::path::PathBuf;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

#[derive(Serialize, Zeroize, ZeroizeOnDrop)]
struct KeyRecord {
    #[zeroize(skip)]
    method: &'static str,
    bits: usize,
    n: String,
    e: String,
    d: String,
}

#[derive(Default)]
pub struct KeyCmd;

impl KeyCmd {
    const OAEP_LABEL: &'static [u8] = b"ifcgen";

    /// OAEP round trip of a random message with the new key
    fn self_check(key: &PrivateKey) -> anyhow::Result<()> {
        let mut rng = DefaultRand::default();
        let oaep = OAEPDecrypt::new(
            key.clone(),
            DefaultDigest::default(),
            DefaultRand::default(),
            Self::OAEP_LABEL,
        )?;

        let mut msg = Zeroizing::new(vec![0u8; oaep.max_msg_len().min(32)]);
        rng.rand(msg.as_mut_slice());

        let (mut c, mut m) = (Vec::new(), Zeroizing::new(Vec::new()));
        oaep.encrypt(msg.as_slice(), &mut c)?;
        oaep.decrypt(c.as_slice(), &mut m)?;

        if m.as_slice() != msg.as_slice() {
            return Err(IfcError::SelfCheckFailed("decrypted message mismatch".to_string()).into());
        }

        Ok(())
    }

    fn generate_key(method: PrimeMethod, nlen: usize, e: &BigUint) -> anyhow::Result<PrivateKey> {
        let retries = crate::cmd::IfcConfig::config().retries;
        for attempt in 0..=retries {
            let pair = generate_pair(method, nlen, e, None)?;
            match PrivateKey::from_primes(pair.p(), pair.q(), e) {
                Ok(key) => return Ok(key),
                Err(err @ CipherError::GenerationExhausted(_)) => {
                    log::warn!("attempt {attempt}: {err}, regenerate the primes");
                }
                Err(err) => return Err(err.into()),
            }
        }

        Err(IfcError::RetriesExhausted(retries + 1).into())
    }
}

impl Cmd for KeyCmd {
    const NAME: &'static str = "key";

    fn cmd() -> Command {
        Command::new(Self::NAME)
            .about("generate an RSA private key from FIPS 186-4 primes")
            .arg(bits_arg())
            .arg(method_arg())
            .arg(exponent_arg())
            .arg(
                Arg::new("output")
                    .long("output")
                    .short('o')
                    .action(ArgAction::Set)
                    .required(false)
                    .value_parser(value_parser!(PathBuf))
                    .help("to specify the output file path to save the key, the file must not exist"),
            )
    }

    fn run(&self, m: &ArgMatches) -> anyhow::Result<()> {
        let (nlen, e) = (bits(m), exponent(m)?);
        let method = m
            .get_one::<PrimeMethod>("method")
            .copied()
            .unwrap_or(PrimeMethod::Probable);

        let key = Self::generate_key(method, nlen, &e)?;
        Self::self_check(&key)?;
        log::info!("{nlen} bits RSA key generated by `{method}`");

        let record = KeyRecord {
            method: method.name(),
            bits: key.public_key().modulus().bits() as usize,
            n: format!("{:x}", key.public_key().modulus()),
            e: format!("{:x}", key.public_key().exponent()),
            d: format!("{:x}", key.private_exponent()),
        };
        let json = Zeroizing::new(serde_json::to_string_pretty(&record)?);
        write_to_file_or_stdout(m, json.as_bytes())
    }
}
