use clap::{value_parser, Arg, ArgAction, Command};
use ifcgen::cmd::{Cmd, IfcConfig, KeyCmd, PrimesCmd, SeedCmd};
use log::LevelFilter;
use std::path::PathBuf;

fn main() {
    env_logger::builder()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .init();

    let version = env!("IFCGEN_VERSION_INFO");
    let app = Command::new("ifcgen")
        .version(version)
        .about("FIPS 186-4 RSA prime pair and key generation")
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .action(ArgAction::Set)
                .required(false)
                .value_parser(value_parser!(PathBuf))
                .help("to specify the config file, default `$HOME/.ifcgen.json`"),
        )
        .subcommand(SeedCmd::cmd())
        .subcommand(PrimesCmd::cmd())
        .subcommand(KeyCmd::cmd())
        .get_matches();

    let _config = IfcConfig::config_with_file(
        app.get_one::<PathBuf>("config")
            .and_then(|p| p.to_str()),
    );

    if let Some((s, m)) = app.subcommand() {
        let res = match s {
            SeedCmd::NAME => SeedCmd.run(m),
            PrimesCmd::NAME => PrimesCmd.run(m),
            KeyCmd::NAME => KeyCmd.run(m),
            name => {
                panic!("unsupport for {}", name)
            }
        };

        if let Err(e) = res {
            log::error!("{e}");
            std::process::exit(1);
        }
    } else {
        println!("{} {}", env!("CARGO_PKG_NAME"), version);
    }
}
