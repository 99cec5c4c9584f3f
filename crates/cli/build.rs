use std::{env, fs, path::PathBuf};

use clap::{Arg, ArgAction, Command, arg, value_parser};

fn output_arg(help: &'static str) -> Arg {
    arg!(-o --output <PATH>)
        .help(help)
        .value_parser(value_parser!(PathBuf))
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=OUT_DIR");

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let completions_dir = out_dir.join("completions");

    fs::create_dir_all(&completions_dir).unwrap();

    let mut cmd = Command::new("ranobe")
        .author("Ranobe Contributors")
        .about("Scrape web novel titles into structured JSON documents")
        .subcommand_required(true)
        .arg(
            arg!(--settings <FILE> "Settings file")
                .global(true)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            arg!(--format <FORMAT> "Page format of the site")
                .global(true)
                .value_parser(["legacy", "modern"]),
        )
        .arg(arg!(--site <HOST> "Site host name").global(true))
        .arg(arg!(--delay <SECS> "Seconds to wait between requests").global(true))
        .arg(arg!(--pretty "Drop the age rating tag from tag lists").global(true))
        .arg(arg!(--compact "Write JSON on a single line").global(true))
        .arg(arg!(-v --verbose "Enable debug logging").global(true))
        .subcommand(
            Command::new("parse")
                .about("Parse titles with their chapters into JSON documents")
                .arg(arg!([SLUG] ... "Title slugs"))
                .arg(arg!(-c --collection <FILE> "File with one slug per line").value_parser(value_parser!(PathBuf)))
                .arg(arg!(--local "Parse again every title saved in the output directory").requires("output"))
                .arg(arg!(--from <SLUG> "Skip slugs listed before this one"))
                .arg(
                    Arg::new("no-amend")
                        .long("no-amend")
                        .action(ArgAction::SetTrue)
                        .help("Only enumerate chapters"),
                )
                .arg(output_arg("Directory to write <slug>.json files into")),
        )
        .subcommand(
            Command::new("collect")
                .about("Collect title slugs from the catalog")
                .arg(arg!(--filters <QUERY> "Raw catalog query filters"))
                .arg(arg!(--pages <NUM> "Maximum number of catalog pages"))
                .arg(output_arg("Output file (default: stdout)")),
        )
        .subcommand(
            Command::new("update")
                .about("List titles updated recently, optionally parsing them")
                .arg(arg!(--hours <HOURS> "Look-back window in hours").default_value("24"))
                .arg(arg!(--amend "Parse every updated title"))
                .arg(output_arg("Output file or directory (default: stdout)")),
        )
        .subcommand(
            Command::new("repair")
                .about("Convert one chapter of a saved title again and update the file")
                .arg(arg!(<FILE> "Title JSON written by parse").value_parser(value_parser!(PathBuf)))
                .arg(arg!(--chapter <ID> "ID of the chapter to convert").required(true).value_parser(value_parser!(u64))),
        )
        .subcommand(
            Command::new("convert")
                .about("Convert a saved chapter fragment to content elements")
                .arg(arg!(<INPUT> "Local HTML file, or '-' for stdin"))
                .arg(arg!(--markdown "Render Markdown instead of JSON"))
                .arg(output_arg("Output file (default: stdout)")),
        )
        .subcommand(
            Command::new("completions")
                .about("Generate a shell completion script")
                .arg(arg!(<SHELL> "Target shell").value_parser(["bash", "zsh", "fish", "powershell", "elvish"])),
        );

    clap_complete::generate_to(clap_complete::shells::Bash, &mut cmd, "ranobe", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Zsh, &mut cmd, "ranobe", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Fish, &mut cmd, "ranobe", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::PowerShell, &mut cmd, "ranobe", &completions_dir).unwrap();

    println!(
        "cargo:warning=Shell completions generated in: {}",
        completions_dir.display()
    );
}
