use std::borrow::Cow;
use std::env;
use std::fs::File;
use std::io::{stdout, BufReader, BufWriter, Read, Seek, Write};
use std::process::exit;
use std::time::Instant;

use getopts::{Matches, Options, ParsingStyle};
use log::info;
use stderrlog::ColorChoice;

use octarank::{BlockEncoder, RankTable, OCTARANK_VERSION_TAG};

fn main() {
	exit(match run() {
		Ok(_) => 0,
		Err(err) => {
			eprintln!("{}", err);
			1
		}
	})
}

fn run() -> Result<(), Cow<'static, str>> {
	let mut options = Options::new();

	options
		.optflag(
			"h",
			"help",
			"Prints information about the accepted command line arguments and exits."
		)
		.optflag(
			"",
			"version",
			"Prints version and copyright information, then exits."
		)
		.optflag(
			"q",
			"quiet",
			"When enabled, the program will only print error messages, unless -h is specified."
		)
		.optflagmulti(
			"v",
			"verbose",
			"Increases the verbosity of the messages. Can be repeated several times."
		)
		.parsing_style(ParsingStyle::StopAtFirstFree);

	match options.parse(env::args().skip(1)) {
		Ok(matches) => {
			if matches.opt_present("h") {
				print_header();
				println!();
				println!("Usage:");
				print!(
					"    {} [OPTION]... <input file> <output file or ->",
					env!("CARGO_BIN_NAME")
				);
				println!("{}", options.usage(""));
			} else if matches.opt_present("version") {
				print_header();
			} else {
				let quiet_mode = matches.opt_present("q");

				if !quiet_mode {
					print_header();
					println!();
				}

				if matches.free.len() != 2 {
					return Err(format!(
						"Too many or few file arguments specified. Run {} -h to see command line argument help",
						env!("CARGO_BIN_NAME")
					))?;
				}

				init_logging(&matches, quiet_mode);

				let input_file_name = &*matches.free[0];
				let input_file = BufReader::new(
					File::open(input_file_name)
						.map_err(|err| format!("Could not open input file: {}", err))?
				);

				let output_file_name = &*matches.free[1];
				let (mut output_stdout, mut output_file);
				let output_file: &mut dyn Write = match output_file_name {
					"-" => {
						output_stdout = stdout().lock();

						&mut output_stdout
					}
					file_path => {
						output_file = BufWriter::new(File::create(file_path).map_err(|err| {
							format!("Could not open output file: {}", err)
						})?);

						&mut output_file
					}
				};

				encode(input_file, input_file_name, output_file, output_file_name)?;
			}

			Ok(())
		}
		Err(parse_err) => Err(format!(
			"{}\nRun {} -h to see command line argument help",
			parse_err,
			env!("CARGO_BIN_NAME")
		))?
	}
}

fn encode<F: Read + Seek>(
	input_file: F,
	input_file_name: &str,
	output_file: &mut dyn Write,
	output_file_name: &str
) -> Result<(), Cow<'static, str>> {
	info!("Building the block rank tables. This takes a few seconds and about 144 MiB of memory...");

	let rank_table =
		RankTable::build().map_err(|err| format!("Could not build the rank tables: {}", err))?;

	info!(
		"Encoding {} and saving to {}...",
		input_file_name, output_file_name
	);

	let encode_begin = Instant::now();
	match BlockEncoder::new(&rank_table).encode(input_file, output_file) {
		Ok(_) => {
			info!(
				"Encoding completed in {:.3} s. Have a nice day!",
				encode_begin.elapsed().as_secs_f64()
			);

			Ok(())
		}
		Err(err) => Err(format!("Error while encoding the input file: {}", err))?
	}
}

fn init_logging(option_matches: &Matches, quiet_mode: bool) {
	let verbosity_level = option_matches.opt_count("v");

	stderrlog::new()
		.module("octarank")
		.verbosity(2 + verbosity_level)
		.show_level(false)
		.quiet(quiet_mode)
		.color(ColorChoice::Never)
		.init()
		.unwrap();
}

fn print_header() {
	println!("{}", OCTARANK_VERSION_TAG);
	println!("{}", env!("CARGO_PKG_DESCRIPTION"));
	println!("Copyright (C) {}", env!("CARGO_PKG_AUTHORS"));
}
