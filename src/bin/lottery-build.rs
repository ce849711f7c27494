use lottery_core::compiler::{build, BuildConfig};
use std::env;
use std::path::{Path, PathBuf};
use std::process::exit;

fn main() {
    let mut source: Option<String> = None;
    let mut out_dir: Option<String> = None;
    let mut config_path: Option<String> = None;

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--source" => source = args.next(),
            "--out-dir" => out_dir = args.next(),
            "--config" => config_path = args.next(),
            _ => {
                eprintln!("unknown arg {}", arg);
                exit(2);
            }
        }
    }

    let mut config = match config_path {
        Some(path) => BuildConfig::load(Path::new(&path)).expect("read build config"),
        None => BuildConfig::default(),
    };
    if let Some(path) = source {
        config.source_path = PathBuf::from(path);
    }
    if let Some(dir) = out_dir {
        config.build_dir = PathBuf::from(dir);
    }

    match build(&config) {
        Ok(path) => println!("wrote {}", path.display()),
        Err(err) => {
            eprintln!("build failed: {:?}", err);
            exit(1);
        }
    }
}
