#![forbid(unsafe_code)]

use anyhow::{Result, anyhow};
use log::{info, error, LevelFilter};
use log4rs::append::console::ConsoleAppender;
use log4rs::config::{Appender, Root};
use log4rs::encode::pattern::PatternEncoder;
use serde::Deserialize;
use std::{env, fs, path::Path};
use fs_mistrust::Mistrust;
use std::os::unix::fs::PermissionsExt;
use lazy_static::lazy_static;
use structopt::StructOpt;

use crate::utils::{wiki_utils, errors::Errors};

use super::wiki_utils::get_absolute_path;

// ***************************************************************************
//                                Constants
// ***************************************************************************
// Directory and file locations. Unless otherwise noted, all files and directories
// are relative to the root directory.
const ENV_WIKI_ROOT_DIR    : &str = "WIKI_ROOT_DIR";
const DEFAULT_ROOT_DIR     : &str = "~/.wiki";
const CONFIG_DIR           : &str = "/config";
const LOGS_DIR             : &str = "/logs";
const DATA_DIR             : &str = "/data";
const TEMPLATES_DIR        : &str = "/templates";
const LOG4RS_CONFIG_FILE   : &str = "/log4rs.yml"; // relative to config dir
const WIKI_CONFIG_FILE     : &str = "/wiki.toml";  // relative to config dir

// Console logging used when no log4rs file is installed.
const DEFAULT_LOG_PATTERN  : &str = "{d(%Y-%m-%d %H:%M:%S%.3f)} {h({l})} {t} - {m}{n}";

// Networking.
const DEFAULT_HTTP_ADDR    : &str = "http://localhost";
const DEFAULT_HTTP_PORT    : u16  = 8080;

// Home page listing.
pub const DEFAULT_LIST_LIMIT : usize = 6;

// ***************************************************************************
//                             Static Variables
// ***************************************************************************
// Assign the command line arguments BEFORE RUNTIME_CTX is initialized in main.
lazy_static! {
    pub static ref WIKI_ARGS: WikiArgs = init_wiki_args();
}

// Calculate the data directories BEFORE RUNTIME_CTX is initialized in main.
lazy_static! {
    pub static ref WIKI_DIRS: WikiDirs = init_wiki_dirs();
}

// ***************************************************************************
//                             Directory Structs
// ***************************************************************************
// ---------------------------------------------------------------------------
// WikiDirs:
// ---------------------------------------------------------------------------
#[derive(Debug)]
pub struct WikiDirs {
    pub root_dir: String,
    pub config_dir: String,
    pub logs_dir: String,
    pub data_dir: String,
    pub templates_dir: String,
}

// ***************************************************************************
//                               Config Structs
// ***************************************************************************
// ---------------------------------------------------------------------------
// WikiArgs:
// ---------------------------------------------------------------------------
#[derive(Debug, StructOpt)]
#[structopt(name = "wiki_args", about = "Command line arguments for the wiki server.")]
pub struct WikiArgs {
    /// Specify the wiki's root data directory.
    ///
    /// This directory contains the configuration, logs and page files.
    #[structopt(short, long)]
    pub root_dir: Option<String>,

    /// Create the data directories and then exit.
    ///
    /// The data directories will be rooted at a root directory calculated
    /// using the following priority order:
    ///
    ///   1. If set, the value of the WIKI_ROOT_DIR environment,
    ///
    ///   2. Otherwise, if set, the value of the --root_dir command line argument,
    ///
    ///   3. Otherwise, ~/.wiki
    ///
    #[structopt(short, long)]
    pub create_dirs_only: bool,
}

// ---------------------------------------------------------------------------
// Parms:
// ---------------------------------------------------------------------------
#[derive(Debug)]
pub struct Parms {
    pub config_file: String,
    pub config: Config,
}

// ---------------------------------------------------------------------------
// RuntimeCtx:
// ---------------------------------------------------------------------------
#[derive(Debug)]
pub struct RuntimeCtx {
    pub parms: Parms,
    pub data_dir: String,
    pub wiki_dirs: &'static WikiDirs,
}

// ---------------------------------------------------------------------------
// Config:
// ---------------------------------------------------------------------------
/** Contents of wiki.toml.  Every field is optional in the file. */
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub title: String,
    pub http_addr: String,
    pub http_port: u16,
    pub list_limit: usize,
    pub data_dir: Option<String>,
}

impl Config {
    pub fn new() -> Self {
        Config::default()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            title: "Wiki".to_string(),
            http_addr: DEFAULT_HTTP_ADDR.to_string(),
            http_port: DEFAULT_HTTP_PORT,
            list_limit: DEFAULT_LIST_LIMIT,
            data_dir: None,
        }
    }
}

// ***************************************************************************
//                            Directory Functions
// ***************************************************************************
// ---------------------------------------------------------------------------
// init_wiki_args:
// ---------------------------------------------------------------------------
/** Get the command line arguments. */
fn init_wiki_args() -> WikiArgs {
    WikiArgs::from_args()
}

// ---------------------------------------------------------------------------
// init_wiki_dirs:
// ---------------------------------------------------------------------------
/** Calculate the external data directories.  The templates directory is
 * optional and is never created here.
 */
fn init_wiki_dirs() -> WikiDirs {
    let mistrust = get_mistrust();

    // Check that each path is absolute and is a directory with the
    // proper permission assign if it exists.  If it doesn't exist,
    // create it.
    let root_dir = get_root_dir();
    check_wiki_dir(&root_dir, "root directory", &mistrust);

    let config_dir = root_dir.clone() + CONFIG_DIR;
    check_wiki_dir(&config_dir, "config directory", &mistrust);

    let logs_dir = root_dir.clone() + LOGS_DIR;
    check_wiki_dir(&logs_dir, "logs directory", &mistrust);

    let data_dir = root_dir.clone() + DATA_DIR;
    check_wiki_dir(&data_dir, "data directory", &mistrust);

    let templates_dir = root_dir.clone() + TEMPLATES_DIR;

    WikiDirs {
        root_dir, config_dir, logs_dir, data_dir, templates_dir,
    }
}

// ---------------------------------------------------------------------------
// check_wiki_dir:
// ---------------------------------------------------------------------------
/** Check that the path is absolute and, if it exists, that is has the proper
 * permissions assigned.  If it doesn't exist, create it.  The mistrust package
 * creates directories with 0o700 permissions.
 *
 * Any failure results in a panic.
 */
fn check_wiki_dir(dir: &String, msgname: &str, mistrust: &Mistrust) {
    let path = Path::new(dir);
    if !path.is_absolute() {
        panic!("The wiki {} path must be absolute: {}", msgname, dir);
    }
    if path.exists() {
        if !path.is_dir() {
            panic!("The wiki {} path must be a directory: {}", msgname, dir);
        }

        // Make sure the directory had rwx for owner only.
        let meta = path.metadata().unwrap_or_else(|_| panic!("Unable to read metadata for {}: {}", msgname, dir));
        let perm = meta.permissions().mode();
        if perm & 0o777 != 0o700 {
            panic!("The wiki {} path must be have 0o700 permissions: {}", msgname, dir);
        }
    } else if let Err(e) = mistrust.make_directory(path) {
        panic!("Make directory error for {:?}: {}", path, &e.to_string());
    }
}

// ---------------------------------------------------------------------------
// get_mistrust:
// ---------------------------------------------------------------------------
/** Configure a new mistrust object for initial directory processing. */
fn get_mistrust() -> Mistrust {
    match Mistrust::builder()
        .ignore_prefix(get_absolute_path("~"))
        .trust_group(0)
        .build() {
            Ok(m) => m,
            Err(e) => {
                panic!("Mistrust configuration error: {}", &e.to_string());
            }
        }
}

// ---------------------------------------------------------------------------
// get_root_dir:
// ---------------------------------------------------------------------------
fn get_root_dir() -> String {
    // Order of precedence:
    //  1. Environment variable
    //  2. Command line --root-dir argument
    //  3. Default location
    //
    let root_dir = env::var(ENV_WIKI_ROOT_DIR).unwrap_or_else(
        |_| {
            match WIKI_ARGS.root_dir.clone() {
                Some(r) => r,
                None => DEFAULT_ROOT_DIR.to_string(),
            }
        });

    get_absolute_path(&root_dir)
}

// ***************************************************************************
//                               Log Functions
// ***************************************************************************
// ---------------------------------------------------------------------------
// init_log:
// ---------------------------------------------------------------------------
/** Initialize log4rs from the config directory's log4rs.yml.  When no such
 * file exists, log to the console at info level.  A file that exists but
 * cannot be used is fatal.
 */
pub fn init_log() {
    let logconfig = init_log_config();
    if !Path::new(&logconfig).is_file() {
        match init_console_log() {
            Ok(_) => info!("Log4rs initialized with console defaults, no file at {}", logconfig),
            Err(e) => panic!("{}: {}", Errors::Log4rsInitialization(logconfig), e),
        }
        return;
    }

    match log4rs::init_file(logconfig.clone(), Default::default()) {
        Ok(_) => (),
        Err(e) => {
            eprintln!("{}", e);
            let s = format!("{}", Errors::Log4rsInitialization(logconfig));
            panic!("{}", s);
        },
    }
    info!("Log4rs initialized using: {}", logconfig);
}

// ---------------------------------------------------------------------------
// init_console_log:
// ---------------------------------------------------------------------------
fn init_console_log() -> Result<()> {
    let stdout = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(DEFAULT_LOG_PATTERN)))
        .build();
    let config = log4rs::Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout)))
        .build(Root::builder().appender("stdout").build(LevelFilter::Info))?;
    log4rs::init_config(config)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// init_log_config:
// ---------------------------------------------------------------------------
fn init_log_config() -> String {
    WIKI_DIRS.config_dir.clone() + LOG4RS_CONFIG_FILE
}

// ***************************************************************************
//                             Parms Functions
// ***************************************************************************
// ---------------------------------------------------------------------------
// get_parms:
// ---------------------------------------------------------------------------
/** Retrieve the application parameters from the configuration file in the
 * config directory.  If the file cannot be read the default values are used.
 */
fn get_parms() -> Result<Parms> {
    let config_file = WIKI_DIRS.config_dir.clone() + WIKI_CONFIG_FILE;

    // Read the configuration file.
    let config_file_abs = wiki_utils::get_absolute_path(&config_file);
    info!("{}", Errors::ReadingConfigFile(config_file_abs.clone()));
    let contents = match fs::read_to_string(&config_file_abs) {
        Ok(c) => c,
        Err(_) => {
            info!("Unable to read configuration at {}. Using default values.", config_file);
            return Ok(Parms { config_file: Default::default(), config: Config::new() });
        }
    };

    let config = parse_config(&contents).map_err(|e| {
        let msg = format!("{}\n   {}", Errors::TOMLParseError(config_file_abs.clone()), e);
        error!("{}", msg);
        anyhow!(msg)
    })?;

    Ok(Parms { config_file: config_file_abs, config })
}

// ---------------------------------------------------------------------------
// parse_config:
// ---------------------------------------------------------------------------
/** Parse and check the toml configuration.  The listing must show at least
 * one page.
 */
pub fn parse_config(contents: &str) -> Result<Config> {
    let config: Config = toml::from_str(contents)?;
    if config.list_limit == 0 {
        return Err(anyhow!("list_limit must be greater than zero"));
    }
    Ok(config)
}

// ***************************************************************************
//                             Config Functions
// ***************************************************************************
// ---------------------------------------------------------------------------
// init_runtime_context:
// ---------------------------------------------------------------------------
pub fn init_runtime_context() -> RuntimeCtx {
    // If this fails the application aborts.
    let parms = get_parms().expect("FAILED to read configuration file.");

    // A data directory named in the configuration file replaces the default.
    let data_dir = match &parms.config.data_dir {
        Some(d) => {
            let d = get_absolute_path(d);
            check_wiki_dir(&d, "configured data directory", &get_mistrust());
            d
        },
        None => WIKI_DIRS.data_dir.clone(),
    };

    RuntimeCtx {parms, data_dir, wiki_dirs: &WIKI_DIRS}
}

// ***************************************************************************
//                                  Tests
// ***************************************************************************
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = Config::new();
        assert_eq!(c.http_port, DEFAULT_HTTP_PORT);
        assert_eq!(c.list_limit, 6);
        assert_eq!(c.data_dir, None);
    }

    #[test]
    fn partial_config_uses_defaults() {
        let c = parse_config("title = \"Notes\"\nhttp_port = 9000\n").unwrap();
        assert_eq!(c.title, "Notes");
        assert_eq!(c.http_port, 9000);
        assert_eq!(c.http_addr, DEFAULT_HTTP_ADDR);
        assert_eq!(c.list_limit, DEFAULT_LIST_LIMIT);
    }

    #[test]
    fn empty_config_is_default() {
        assert_eq!(parse_config("").unwrap(), Config::default());
    }

    #[test]
    fn bad_config_is_rejected() {
        assert!(parse_config("http_port = \"eighty\"").is_err());
        assert!(parse_config("list_limit = 0").is_err());
    }
}
