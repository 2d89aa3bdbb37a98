use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::time::Instant;
use std::{env, fs, process};

use snarl_dist::{utils, DistanceIndex, GraphInterface};
use snarl_dist::formats;

use getopts::Options;

//-----------------------------------------------------------------------------

fn main() -> Result<(), String> {
    let start_time = Instant::now();

    // Parse arguments.
    let config = Config::new();

    // Check if the index already exists.
    if utils::file_exists(&config.output_file) {
        if config.overwrite {
            eprintln!("Overwriting index {}", config.output_file.display());
            fs::remove_file(&config.output_file).map_err(|x| x.to_string())?;
        } else {
            return Err(format!("Index {} already exists", config.output_file.display()));
        }
    }

    // Load the inputs.
    let mut reader = utils::open_file(&config.gfa_file)?;
    let graph = formats::read_gfa(&mut reader)?;
    let mut reader = utils::open_file(&config.snarls_file)?;
    let manager = formats::read_snarls(&mut reader)?;

    // Build and serialize the index.
    let index = DistanceIndex::new(&graph, &manager, config.cap, config.verbose)?;
    let file = File::create(&config.output_file).map_err(|x| x.to_string())?;
    let mut writer = BufWriter::new(file);
    index.serialize(&mut writer).map_err(|x| x.to_string())?;

    // Statistics.
    eprintln!("Indexed {} snarls in {} chains over {} nodes",
        index.num_snarls(), index.num_chains(), graph.node_count()
    );
    eprintln!("Index size: {}", utils::human_readable_size(index.size_in_bytes()));

    let end_time = Instant::now();
    let seconds = end_time.duration_since(start_time).as_secs_f64();
    eprintln!("Used {:.3} seconds", seconds);

    Ok(())
}

//-----------------------------------------------------------------------------

struct Config {
    pub gfa_file: PathBuf,
    pub snarls_file: PathBuf,
    pub output_file: PathBuf,
    pub cap: usize,
    pub overwrite: bool,
    pub verbose: bool,
}

impl Config {
    const DEFAULT_CAP: usize = 10000;

    pub fn new() -> Config {
        let args: Vec<String> = env::args().collect();
        let program = args[0].clone();

        let mut opts = Options::new();
        opts.optflag("h", "help", "print this help");
        opts.optopt("c", "cap", "upper limit for maximum distances (default 10000)", "INT");
        opts.optopt("o", "output", "output file name (default: <graph>.dist)", "FILE");
        opts.optflag("", "overwrite", "overwrite the index file if it exists");
        opts.optflag("v", "verbose", "print progress information");
        let matches = match opts.parse(&args[1..]) {
            Ok(m) => m,
            Err(f) => {
                eprintln!("{}", f);
                process::exit(1);
            }
        };

        let header = format!("Usage: {} [options] graph.gfa snarls.txt", program);
        if matches.opt_present("h") {
            eprint!("{}", opts.usage(&header));
            process::exit(0);
        }

        let mut cap = Self::DEFAULT_CAP;
        if let Some(s) = matches.opt_str("c") {
            cap = match s.parse::<usize>() {
                Ok(value) => value,
                Err(_) => {
                    eprintln!("Invalid cap {}", s);
                    process::exit(1);
                }
            };
        }

        let (gfa_file, snarls_file) = if matches.free.len() == 2 {
            (PathBuf::from(&matches.free[0]), PathBuf::from(&matches.free[1]))
        } else {
            eprint!("{}", opts.usage(&header));
            process::exit(1);
        };

        let output_file = match matches.opt_str("o") {
            Some(s) => PathBuf::from(s),
            None => PathBuf::from(format!("{}.dist", gfa_file.display())),
        };

        Config {
            gfa_file,
            snarls_file,
            output_file,
            cap,
            overwrite: matches.opt_present("overwrite"),
            verbose: matches.opt_present("v"),
        }
    }
}

//-----------------------------------------------------------------------------
