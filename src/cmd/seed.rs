use crate::cmd::{bits, bits_arg, Cmd};
use cipher::ifc::get_seed;
use cipher::DefaultRand;
use clap::{ArgMatches, Command};
use serde::Serialize;
use zeroize::{Zeroize, ZeroizeOnDrop};

#[derive(Serialize, Zeroize, ZeroizeOnDrop)]
struct SeedRecord {
    bits: usize,
    seed: String,
}

#[derive(Default)]
pub struct SeedCmd;

impl Cmd for SeedCmd {
    const NAME: &'static str = "seed";

    fn cmd() -> Command {
        Command::new(Self::NAME)
            .about("generate a seed for the provable prime generation, 2 * security strength bits")
            .arg(bits_arg())
    }

    fn run(&self, m: &ArgMatches) -> anyhow::Result<()> {
        let nlen = bits(m);
        let seed = get_seed(nlen, &mut DefaultRand::default())?;

        let record = SeedRecord {
            bits: seed.bits(),
            seed: format!("{:x}", seed.as_biguint()),
        };
        println!("{}", serde_json::to_string_pretty(&record)?);

        Ok(())
    }
}
