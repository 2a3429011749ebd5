// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::path::Path;

use anyhow::Result;
use lcov_sourcemap::{get_lcov, write_lcov, Config, RemapError};
use pretty_assertions::assert_eq;
use tempfile::{tempdir, TempDir};
use tokio::fs;

// Generated lines 1-4 map to app.ts:1, app.ts:3, util.ts:1 and gone.ts:1.
const APP_MAP: &str = r#"{
    "version": 3,
    "file": "app.js",
    "sources": ["../src/app.ts", "../src/util.ts", "../src/gone.ts"],
    "names": [],
    "mappings": "AAAA;AAEA;ACFA;ACAA"
}"#;

const VENDOR_MAP: &str = r#"{
    "version": 3,
    "sourceRoot": "",
    "sources": ["webpack:///./src/vendor.ts"],
    "names": [],
    "mappings": "AAAA"
}"#;

struct Project {
    dir: TempDir,
}

impl Project {
    async fn new() -> Result<Self> {
        let dir = tempdir()?;

        for sub in ["dist", "src"] {
            fs::create_dir_all(dir.path().join(sub)).await?;
        }

        for file in ["src/app.ts", "src/util.ts", "src/vendor.ts", "dist/app.js"] {
            fs::write(dir.path().join(file), "").await?;
        }

        fs::write(dir.path().join("dist/app.js.map"), APP_MAP).await?;
        fs::write(dir.path().join("dist/vendor.js.map"), VENDOR_MAP).await?;

        Ok(Self { dir })
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }

    fn key(&self, generated: &str) -> String {
        self.root().join(generated).to_string_lossy().into_owned()
    }

    fn lcov(&self) -> String {
        format!(
            "TN:
SF:{}
FN:2,start
FNDA:4,start
FNF:1
FNH:1
DA:1,1
DA:2,4
DA:3,0
DA:4,9
LF:4
LH:3
BRDA:2,0,0,4
BRDA:2,0,1,-
BRF:2
BRH:1
end_of_record
TN:
SF:{}
DA:1,2
LF:1
LH:1
end_of_record
",
            self.key("dist/app.js"),
            self.key("dist/vendor.js"),
        )
    }

    fn config(&self) -> Config {
        Config::new(self.root())
    }
}

const EXPECTED: &str = "\
TN:
SF:src/app.ts
FN:3,start
FNF:1
FNH:1
FNDA:4,start
DA:1,1
DA:3,4
LF:2
LH:2
BRDA:3,0,0,4
BRDA:3,0,1,0
BRF:2
BRH:1
end_of_record
TN:
SF:src/util.ts
FNF:0
FNH:0
DA:1,0
LF:1
LH:0
BRF:0
BRH:0
end_of_record
TN:
SF:src/vendor.ts
FNF:0
FNH:0
DA:1,2
LF:1
LH:1
BRF:0
BRH:0
end_of_record";

#[tokio::test]
async fn remaps_onto_existing_sources() -> Result<()> {
    let project = Project::new().await?;

    let output = get_lcov(&project.lcov(), &project.config()).await?;

    // `src/gone.ts` is not on disk, so its block is dropped.
    assert_eq!(output, EXPECTED);

    Ok(())
}

#[tokio::test]
async fn keeps_missing_sources_without_existence_check() -> Result<()> {
    let project = Project::new().await?;

    let config = Config {
        check_exists: false,
        ..project.config()
    };

    let output = get_lcov(&project.lcov(), &config).await?;

    assert!(output.contains("SF:src/gone.ts\nFNF:0\nFNH:0\nDA:1,9\n"));
    assert_eq!(output.matches("end_of_record").count(), 4);

    Ok(())
}

#[tokio::test]
async fn output_reparses() -> Result<()> {
    let project = Project::new().await?;

    let output = get_lcov(&project.lcov(), &project.config()).await?;
    let report = lcov::LcovReport::parse(&output)?;

    let keys: Vec<_> = report.keys().collect();
    assert_eq!(keys, vec!["src/app.ts", "src/util.ts", "src/vendor.ts"]);

    let app = report.get("src/app.ts").unwrap();
    assert_eq!(app.lines.found(), 2);
    assert_eq!(app.branches.hit(), 1);

    Ok(())
}

#[tokio::test]
async fn missing_map_fails_whole_run() -> Result<()> {
    let project = Project::new().await?;
    let lcov = format!(
        "{}SF:{}\nDA:1,1\nend_of_record\n",
        project.lcov(),
        project.key("dist/other.js")
    );

    let err = get_lcov(&lcov, &project.config()).await.unwrap_err();
    let err = err.downcast::<RemapError>()?;

    assert!(matches!(err, RemapError::MissingSourceMap { .. }));
    assert_eq!(err.key(), project.key("dist/other.js"));

    Ok(())
}

#[tokio::test]
async fn pass_through_keeps_unmapped_files() -> Result<()> {
    let project = Project::new().await?;
    fs::write(project.root().join("dist/plain.js"), "").await?;

    let lcov = format!(
        "{}SF:{}\nDA:1,1\nDA:2,0\nend_of_record\n",
        project.lcov(),
        project.key("dist/plain.js")
    );

    let config = Config {
        pass_through: true,
        ..project.config()
    };

    let output = get_lcov(&lcov, &config).await?;

    assert!(output.starts_with(EXPECTED));
    assert!(output.ends_with(
        "SF:dist/plain.js.unmapped\nFNF:0\nFNH:0\nDA:1,1\nDA:2,0\nLF:2\nLH:1\nBRF:0\nBRH:0\nend_of_record"
    ));

    Ok(())
}

#[tokio::test]
async fn explicit_inline_map() -> Result<()> {
    let project = Project::new().await?;

    // {"version":3,"sources":["../src/util.ts"],"mappings":"AAAA"}
    let generated = "module.exports = 1;\n\
        //# sourceMappingURL=data:application/json;charset=utf-8;base64,\
        eyJ2ZXJzaW9uIjozLCJzb3VyY2VzIjpbIi4uL3NyYy91dGlsLnRzIl0sIm1hcHBpbmdzIjoiQUFBQSJ9\n";

    let key = project.key("dist/inline.js");
    fs::write(&key, generated).await?;

    let mut config = project.config();
    config.maps.insert(key.clone(), key.clone().into());

    let lcov = format!("SF:{key}\nDA:1,3\nend_of_record\n");
    let output = get_lcov(&lcov, &config).await?;

    assert!(output.starts_with("TN:\nSF:src/util.ts\n"));
    assert!(output.contains("DA:1,3\n"));

    Ok(())
}

#[tokio::test]
async fn writes_output_file() -> Result<()> {
    let project = Project::new().await?;
    let output = project.root().join("coverage").join("lcov.info");

    write_lcov(&project.lcov(), &project.config(), &output).await?;

    assert_eq!(fs::read_to_string(&output).await?, EXPECTED);

    Ok(())
}
