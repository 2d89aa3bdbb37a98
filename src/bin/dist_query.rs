use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::time::Instant;
use std::{env, process};

use snarl_dist::{utils, DistanceIndex, Position};
use snarl_dist::formats;

use getopts::Options;

//-----------------------------------------------------------------------------

fn main() -> Result<(), String> {
    let start_time = Instant::now();

    // Parse arguments.
    let config = Config::new();

    // Load the graph, the decomposition, and the index.
    let mut reader = utils::open_file(&config.gfa_file)?;
    let graph = formats::read_gfa(&mut reader)?;
    let mut reader = utils::open_file(&config.snarls_file)?;
    let manager = formats::read_snarls(&mut reader)?;
    let file = File::open(&config.index_file).map_err(|x| x.to_string())?;
    let mut reader = BufReader::new(file);
    let index = DistanceIndex::load(&graph, &manager, &mut reader)?;
    if config.verbose {
        eprintln!("Loaded a distance index of {} snarls with cap {}", index.num_snarls(), index.cap());
    }

    // Answer the queries.
    for (pos1, pos2) in config.queries.iter() {
        let distance = if config.maximum {
            index.max_distance(*pos1, *pos2)?
        } else {
            index.min_distance(*pos1, *pos2)?
        };
        println!("{}\t{}\t{}", pos1, pos2, distance);
    }

    if config.verbose {
        let end_time = Instant::now();
        let seconds = end_time.duration_since(start_time).as_secs_f64();
        eprintln!("Used {:.3} seconds", seconds);
    }

    Ok(())
}

//-----------------------------------------------------------------------------

struct Config {
    pub index_file: PathBuf,
    pub gfa_file: PathBuf,
    pub snarls_file: PathBuf,
    pub queries: Vec<(Position, Position)>,
    pub maximum: bool,
    pub verbose: bool,
}

impl Config {
    pub fn new() -> Config {
        let args: Vec<String> = env::args().collect();
        let program = args[0].clone();

        let mut opts = Options::new();
        opts.optflag("h", "help", "print this help");
        opts.optflag("m", "max", "report capped maximum distances instead of minimum distances");
        opts.optflag("v", "verbose", "print progress information");
        let matches = match opts.parse(&args[1..]) {
            Ok(m) => m,
            Err(f) => {
                eprintln!("{}", f);
                process::exit(1);
            }
        };

        let header = format!(
            "Usage: {} [options] index.dist graph.gfa snarls.txt pos1 pos2 [pos1 pos2 ...]\n\n\
            Positions are given as node:offset or node:offset:+/-.",
            program
        );
        if matches.opt_present("h") {
            eprint!("{}", opts.usage(&header));
            process::exit(0);
        }

        if matches.free.len() < 5 || (matches.free.len() - 3) % 2 != 0 {
            eprint!("{}", opts.usage(&header));
            process::exit(1);
        }
        let index_file = PathBuf::from(&matches.free[0]);
        let gfa_file = PathBuf::from(&matches.free[1]);
        let snarls_file = PathBuf::from(&matches.free[2]);

        let mut queries: Vec<(Position, Position)> = Vec::new();
        for pair in matches.free[3..].chunks(2) {
            let pos1 = match formats::parse_position(&pair[0]) {
                Ok(pos) => pos,
                Err(message) => {
                    eprintln!("{}", message);
                    process::exit(1);
                }
            };
            let pos2 = match formats::parse_position(&pair[1]) {
                Ok(pos) => pos,
                Err(message) => {
                    eprintln!("{}", message);
                    process::exit(1);
                }
            };
            queries.push((pos1, pos2));
        }

        Config {
            index_file,
            gfa_file,
            snarls_file,
            queries,
            maximum: matches.opt_present("m"),
            verbose: matches.opt_present("v"),
        }
    }
}

//-----------------------------------------------------------------------------
