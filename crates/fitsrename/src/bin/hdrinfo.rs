use fitsrename::batch::format_entry;
use fitsrename::{classify, read_header, HeaderFormat, HeaderMap};
use std::path::Path;
use std::process;

fn format_header(header: &HeaderMap, verbose: bool) -> String {
    let mut out = String::new();
    for (keyword, value) in header.iter() {
        out.push_str(&format_entry(keyword, value));
        out.push('\n');
    }
    if verbose {
        out.push('\n');
        match classify(header) {
            Ok(frame) => out.push_str(&format!("Frame type: {}\n", frame)),
            Err(reason) => out.push_str(&format!("Frame type: unclassified ({})\n", reason)),
        }
        out.push_str(&format!("Keywords: {}\n", header.len()));
    }
    out
}

fn run(args: &[String]) -> Result<String, String> {
    let mut verbose = false;
    let mut file_path = None;

    for arg in args {
        if arg == "-v" || arg == "--verbose" {
            verbose = true;
        } else if arg.starts_with('-') {
            return Err(format!("Unknown option: {}", arg));
        } else {
            if file_path.is_some() {
                return Err("Too many arguments".to_string());
            }
            file_path = Some(arg.as_str());
        }
    }

    let path = file_path.ok_or_else(|| {
        "Usage: hdrinfo [-v] <file.fits|file.xisf>\n\nPrint the header keywords of a FITS or XISF file."
            .to_string()
    })?;

    let format = HeaderFormat::from_path(Path::new(path))
        .ok_or_else(|| format!("Unsupported file type '{}': expected .fits, .fit, .fts or .xisf", path))?;
    let header =
        read_header(Path::new(path), format).map_err(|e| format!("Error reading '{}': {}", path, e))?;

    Ok(format_header(&header, verbose))
}

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(&args) {
        Ok(output) => print!("{}", output),
        Err(msg) => {
            eprintln!("{}", msg);
            process::exit(1);
        }
    }
}
