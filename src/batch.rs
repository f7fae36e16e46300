//! Parallel conversion of many files.

use std::{
    collections::{hash_map::Entry, HashMap},
    fs,
    path::{Path, PathBuf},
};

use log::warn;
use rayon::prelude::*;

use crate::{convert_file, Conversion, Error, Options, Result};

pub struct BatchItem {
    pub input: PathBuf,
    pub output: PathBuf,
    pub result: Result<Conversion>,
}

/// `<out_dir>/<input file stem>.bin`
pub fn output_path(input: &Path, out_dir: &Path) -> PathBuf {
    let mut name = input.file_stem().unwrap_or(input.as_os_str()).to_os_string();
    name.push(".bin");
    out_dir.join(name)
}

/// Converts every input independently, creating `out_dir` if needed. Results are returned in
/// input order.
///
/// Inputs sharing a file stem would write the same output. Only the first of them is
/// converted; the others fail with [`Error::DuplicateOutput`].
pub fn convert_all(inputs: &[PathBuf], out_dir: &Path, opts: &Options) -> Result<Vec<BatchItem>> {
    fs::create_dir_all(out_dir).map_err(Error::io(out_dir))?;

    let mut owners = HashMap::<PathBuf, &Path>::new();
    let jobs = inputs
        .iter()
        .map(|input| {
            let output = output_path(input, out_dir);
            let first_input = match owners.entry(output.clone()) {
                Entry::Occupied(owner) => Some(owner.get().to_path_buf()),
                Entry::Vacant(slot) => {
                    slot.insert(input);
                    None
                }
            };
            (input, output, first_input)
        })
        .collect::<Vec<_>>();

    Ok(jobs
        .into_par_iter()
        .map(|(input, output, first_input)| {
            let result = match first_input {
                Some(first_input) => {
                    warn!(
                        "Skipping {}: {} would overwrite the output of {}",
                        input.display(),
                        output.display(),
                        first_input.display()
                    );
                    Err(Error::DuplicateOutput {
                        path: output.clone(),
                        first_input,
                    })
                }
                None => convert_file(input, &output, opts),
            };
            BatchItem {
                input: input.clone(),
                output,
                result,
            }
        })
        .collect())
}
