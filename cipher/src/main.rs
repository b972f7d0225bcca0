// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use std::io::{self, Read};

use anyhow::{Context, Result, anyhow, bail};
use clap::{ArgAction, Parser};
use gateway_cipher::constants::MASTER_KEY_ENV;
use gateway_cipher::{MasterKey, decrypt, encrypt};
use zeroize::Zeroizing;

/// Seals a service password for the gateway configuration file, or opens a
/// sealed value to check it was produced with the current master key.
///
/// The master key is read from the `MASTER_KEY` environment variable.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct SealOptions {
    /// Open a sealed value instead of sealing a plaintext one.
    #[arg(long, default_value = "false", action = ArgAction::SetTrue)]
    decrypt: bool,
    /// Value to process. Read from stdin when omitted.
    value: Option<String>,
}

/// The argument if given, otherwise everything on `input`, without the
/// trailing line ending.
fn read_value(value: Option<String>, mut input: impl Read) -> Result<Zeroizing<String>> {
    let value = match value {
        Some(value) => Zeroizing::new(value),
        None => {
            let mut buffer = Zeroizing::new(String::new());
            input
                .read_to_string(&mut buffer)
                .context("failed to read value from stdin")?;
            buffer
        }
    };

    let trimmed = value.trim_end_matches(['\r', '\n']);
    if trimmed.is_empty() {
        bail!("no value provided");
    }

    Ok(Zeroizing::new(trimmed.to_string()))
}

fn main() -> Result<()> {
    let options = SealOptions::parse();

    let raw_key = Zeroizing::new(
        std::env::var(MASTER_KEY_ENV).map_err(|_| anyhow!("{MASTER_KEY_ENV} must be set"))?,
    );
    let key = MasterKey::try_from(raw_key.as_str())
        .map_err(|err| anyhow!("[seal] {MASTER_KEY_ENV} rejected: {err}"))?;

    let value = read_value(options.value, io::stdin())?;

    if options.decrypt {
        let plaintext = decrypt(&key, &value).map_err(|err| anyhow!("[seal] {err}"))?;
        println!("{}", plaintext.as_str());
    } else {
        let sealed = encrypt(&key, &value).map_err(|err| anyhow!("[seal] {err}"))?;
        println!("{sealed}");
    }

    Ok(())
}
