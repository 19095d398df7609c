use crate::cmd::{bits, bits_arg, parse_hex, with_retries, Cmd, IfcConfig};
use crate::error::IfcError;
use crate::log_error;
use cipher::ifc::{MillerRabinRounds, PrimeMethod, PrimePair, Seed};
use cipher::{CipherError, DefaultDigest, DefaultRand};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use num_bigint::BigUint;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use serde::Serialize;
use zeroize::{Zeroize, ZeroizeOnDrop};

#[derive(Serialize, Zeroize, ZeroizeOnDrop)]
struct PrimeRecord {
    #[zeroize(skip)]
    method: &'static str,
    bits: usize,
    p: String,
    q: String,
    n: String,
}

pub(super) fn method_arg() -> Arg {
    Arg::new("method")
        .long("method")
        .short('m')
        .action(ArgAction::Set)
        .default_value("probable")
        .value_parser(|s: &str| s.parse::<PrimeMethod>())
        .help("provable/probable/provable-cond/probable-cond/probable-cond-direct, FIPS 186-4 B.3.2-B.3.6")
}

pub(super) fn exponent_arg() -> Arg {
    Arg::new("exponent")
        .long("exponent")
        .short('e')
        .action(ArgAction::Set)
        .value_parser(|s: &str| parse_hex(s))
        .help("to specify the hex public exponent, odd and 2^16 < e < 2^256, default from the config")
}

pub(super) fn exponent(m: &ArgMatches) -> Result<BigUint, IfcError> {
    match m.get_one::<BigUint>("exponent") {
        Some(e) => Ok(e.clone()),
        None => parse_hex(&IfcConfig::config().exponent),
    }
}

/// Generate one prime pair, retrying with a fresh seed when the search is exhausted.
/// `seed` is only used by the first attempt.
pub(super) fn generate_pair(
    method: PrimeMethod,
    nlen: usize,
    e: &BigUint,
    seed: Option<Seed>,
) -> anyhow::Result<PrimePair> {
    let (mut hasher, mut rng) = (DefaultDigest::default(), DefaultRand::default());
    let rounds = MillerRabinRounds::for_ifc(nlen)?;
    let mut seed = seed;

    let pair = with_retries(IfcConfig::config().retries, |_| {
        let gen = method.prime_gen(nlen, seed.take(), &mut rng)?;
        gen.generate(e, nlen, &mut hasher, &mut rng)
    })?;

    pair.check(e, nlen, rounds.aux, &mut rng)?;
    Ok(pair)
}

#[derive(Default)]
pub struct PrimesCmd;

impl PrimesCmd {
    fn record(method: PrimeMethod, nlen: usize, pair: &PrimePair) -> PrimeRecord {
        PrimeRecord {
            method: method.name(),
            bits: nlen,
            p: format!("{:x}", pair.p()),
            q: format!("{:x}", pair.q()),
            n: format!("{:x}", pair.modulus()),
        }
    }
}

impl Cmd for PrimesCmd {
    const NAME: &'static str = "primes";

    fn cmd() -> Command {
        Command::new(Self::NAME)
            .about("generate the RSA prime pairs p and q")
            .arg(bits_arg())
            .arg(method_arg())
            .arg(exponent_arg())
            .arg(
                Arg::new("seed")
                    .long("seed")
                    .short('s')
                    .action(ArgAction::Set)
                    .value_parser(|s: &str| parse_hex(s))
                    .help("to specify the hex seed of the provable methods, a fresh seed is used if not given"),
            )
            .arg(
                Arg::new("count")
                    .long("count")
                    .short('n')
                    .action(ArgAction::Set)
                    .default_value("1")
                    .value_parser(value_parser!(usize))
                    .help("to specify how many prime pairs to generate in parallel"),
            )
    }

    fn run(&self, m: &ArgMatches) -> anyhow::Result<()> {
        let (nlen, e) = (bits(m), exponent(m)?);
        let method = m
            .get_one::<PrimeMethod>("method")
            .copied()
            .unwrap_or(PrimeMethod::Probable);
        let count = m.get_one::<usize>("count").copied().unwrap_or(1);
        let seed = m.get_one::<BigUint>("seed").cloned().map(Seed::from_biguint);

        if seed.is_some() && (count != 1 || !method.needs_seed()) {
            return Err(IfcError::InvalidArgument(format!(
                "the seed only applies to one pair of the seeded methods, not `{count}` pairs of `{method}`"
            ))
            .into());
        }

        if !method.approved_lengths().contains(&nlen) {
            return Err(CipherError::InvalidParameter(format!(
                "`{method}` supports the modulus lengths {:?}, not `{nlen}`",
                method.approved_lengths()
            ))
            .into());
        }

        let records = if count == 1 {
            let pair = generate_pair(method, nlen, &e, seed)?;
            vec![Self::record(method, nlen, &pair)]
        } else {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(IfcConfig::config().threads)
                .build()?;
            log::info!("generate {count} prime pairs with {} threads", pool.current_num_threads());

            let records = pool.install(|| {
                (0..count)
                    .into_par_iter()
                    .filter_map(|_| {
                        log_error(generate_pair(method, nlen, &e, None))
                            .map(|pair| Self::record(method, nlen, &pair))
                    })
                    .collect::<Vec<_>>()
            });

            if records.len() != count {
                log::error!("only {} of {count} prime pairs generated", records.len());
            }
            records
        };

        println!("{}", serde_json::to_string_pretty(&records)?);
        Ok(())
    }
}
