// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::collections::BTreeMap;
use std::path::PathBuf;

use futures::future::try_join_all;
use log::*;
use path_absolutize::Absolutize;
use srcmap::SourceMap;
use tokio::io::ErrorKind::NotFound;

use crate::config::Config;
use crate::error::RemapError;

/// Load the source map of every coverage key, concurrently.
///
/// Keys whose map file does not exist are left out of the result; whether that is fatal is up
/// to [`remap`](crate::remap::remap). Any other failure to read or parse a map fails the whole
/// load.
pub async fn load_maps<'a>(
    keys: impl IntoIterator<Item = &'a str>,
    config: &Config,
) -> Result<BTreeMap<String, SourceMap>, RemapError> {
    let loads = keys
        .into_iter()
        .map(|key| load_map(key.to_owned(), config.map_path(key)));

    let maps: BTreeMap<_, _> = try_join_all(loads).await?.into_iter().flatten().collect();

    info!("loaded {} source maps", maps.len());

    Ok(maps)
}

async fn load_map(
    key: String,
    path: PathBuf,
) -> Result<Option<(String, SourceMap)>, RemapError> {
    let fail = |key: &str, path: &PathBuf, source: srcmap::Error| RemapError::SourceMap {
        key: key.to_owned(),
        path: path.clone(),
        source,
    };

    // Map-relative sources are resolved against the map's directory, so it must be absolute.
    let path = match path.absolutize() {
        Ok(absolute) => absolute.into_owned(),
        Err(err) => return Err(fail(&key, &path, err.into())),
    };

    let data = match tokio::fs::read(&path).await {
        Ok(data) => data,
        Err(err) if err.kind() == NotFound => {
            debug!("no source map for {} at {}", key, path.display());
            return Ok(None);
        }
        Err(err) => return Err(fail(&key, &path, err.into())),
    };

    let map = SourceMap::from_contents(&path, &data).map_err(|err| fail(&key, &path, err))?;

    debug!("loaded source map for {} from {}", key, path.display());

    Ok(Some((key, map)))
}
