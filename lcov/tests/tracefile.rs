// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use pretty_assertions::assert_eq;

use anyhow::Result;
use lcov::{BranchDetail, FunctionDetail, LcovReport, LineDetail};

#[test]
fn test_parse_tracefile() -> Result<()> {
    let text = include_str!("files/bundle.info");
    let report = LcovReport::parse(text)?;

    assert_eq!(
        report.keys().collect::<Vec<_>>(),
        vec!["dist/bundle.js", "dist/vendor.js"]
    );

    let bundle = report.get("dist/bundle.js").unwrap();

    assert_eq!(
        bundle.functions.details(),
        &[
            FunctionDetail::new("add", 2, 4),
            FunctionDetail::new("(anonymous_1)", 7, 0),
        ]
    );
    assert_eq!(bundle.functions.hit(), 1);

    assert_eq!(
        bundle.lines.details(),
        &[
            LineDetail::new(2, 4),
            LineDetail::new(3, 4),
            LineDetail::new(7, 0),
            LineDetail::new(8, 0),
        ]
    );
    assert_eq!((bundle.lines.found(), bundle.lines.hit()), (4, 2));

    assert_eq!(
        bundle.branches.details(),
        &[
            BranchDetail::new(3, 0, 0, 3),
            BranchDetail::new(3, 0, 1, 1),
            BranchDetail::new(8, 1, 0, 0),
        ]
    );
    assert_eq!((bundle.branches.found(), bundle.branches.hit()), (3, 2));

    Ok(())
}

#[test]
fn test_tracefile_survives_rewrite() -> Result<()> {
    let text = include_str!("files/bundle.info");
    let report = LcovReport::parse(text)?;

    let rewritten = lcov::write_report(report.files());
    let reparsed = LcovReport::parse(&rewritten)?;

    assert_eq!(reparsed, report);

    Ok(())
}
