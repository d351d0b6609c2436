#![forbid(unsafe_code)]

use path_absolutize::Absolutize;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use glob::{glob, Pattern};

use poem::Request;

use anyhow::{Result, anyhow};
use log::{error, debug, LevelFilter};

// ***************************************************************************
// GENERAL PUBLIC FUNCTIONS
// ***************************************************************************
// ---------------------------------------------------------------------------
// get_absolute_path:
// ---------------------------------------------------------------------------
/** Replace tilde (~) and environment variable values in a path name and
 * then construct the absolute path name.  Unlike canonicalize, absolutize
 * does not require the file to exist.  On any failure the original input is
 * returned unchanged.
 */
pub fn get_absolute_path(path: &str) -> String {
    let s = match shellexpand::full(path) {
        Ok(x) => x,
        Err(_) => return path.to_owned(),
    };

    let p = Path::new(s.deref());
    let p1 = match p.absolutize() {
        Ok(x) => x,
        Err(_) => return path.to_owned(),
    };
    match p1.to_str() {
        Some(x) => x.to_owned(),
        None => path.to_owned(),
    }
}

// ---------------------------------------------------------------------------
// get_files_in_dir:
// ---------------------------------------------------------------------------
/** Return a list of PathBufs representing the immediate children of the directory.
 * This function is not recursive and does not include subdirectories.  Glob
 * metacharacters in the directory name are matched literally.
 */
pub fn get_files_in_dir(dir: &str) -> Result<Vec<PathBuf>> {
    let mut v = vec!();
    let escaped = Pattern::escape(dir);
    let pattern = if escaped.ends_with('/') {escaped + "*"} else {escaped + "/*"};

    for entry in glob(&pattern)? {
        match entry {
            Ok(f) => {
                if f.is_file() {v.push(f);}
            },
            Err(e) => {
                let msg = format!("Unable to access a directory entry in {}: {:?}.", &pattern, e);
                error!("{}", msg);
                return Result::Err(anyhow!(msg));
            },
        }
    }

    Ok(v)
}

// ***************************************************************************
//                                  Traits
// ***************************************************************************
pub trait RequestDebug {
    type Req;
    fn get_request_info(&self) -> String;
}

// ---------------------------------------------------------------------------
// debug_request:
// ---------------------------------------------------------------------------
// Dump http request information to the log.
pub fn debug_request(http_req: &Request, req: &impl RequestDebug) {
    // Check that debug or higher logging is in effect.
    let level = log::max_level();
    if level < LevelFilter::Debug {
        return;
    }

    let mut s = "\n".to_string();

    // Restate the method and URI.
    let uri = http_req.uri();
    s += format!("  {} {:?}\n", http_req.method(), uri).as_str();

    for v in http_req.headers().iter() {
         s += format!("  Header: {} = {:?} \n", v.0, v.1).as_str();
    };

    if let Some(q) = uri.query() {
        s += format!("  Query Parameters: {:?}\n", q).as_str();
    } else {
        s += "  * No Query Parameters\n";
    }

    // Add the request's information.
    s += req.get_request_info().as_str();

    // Write the single log record.
    debug!("{}", s);
}

// ***************************************************************************
//                                  Tests
// ***************************************************************************
#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn absolute_path_expands_relative() {
        let p = get_absolute_path("some/rel/dir");
        assert!(Path::new(&p).is_absolute());
        assert!(p.ends_with("some/rel/dir"));
    }

    #[test]
    fn files_in_dir_skips_subdirectories() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "a").unwrap();
        fs::write(dir.path().join("b.txt"), "b").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested").join("c.txt"), "c").unwrap();

        let mut files = get_files_in_dir(dir.path().to_str().unwrap()).unwrap();
        files.sort();
        let names: Vec<String> = files.iter()
            .map(|f| f.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.txt", "b.txt"]);
    }

    #[test]
    fn files_in_dir_escapes_glob_characters() {
        let dir = tempfile::tempdir().unwrap();
        let odd = dir.path().join("pages[1]");
        fs::create_dir(&odd).unwrap();
        fs::write(odd.join("x.txt"), "x").unwrap();

        let files = get_files_in_dir(odd.to_str().unwrap()).unwrap();
        assert_eq!(files.len(), 1);
    }
}
