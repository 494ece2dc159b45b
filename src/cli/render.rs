use std::fs;
use std::io::{self, Read};

use anyhow::{Context, Result};

use crate::markdown;

pub fn run(file: Option<String>) -> Result<()> {
    let text = match file {
        Some(path) => {
            fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path))?
        }
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    println!("{}", markdown::render(&text));
    Ok(())
}
