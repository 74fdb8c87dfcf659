//! End-to-end behavior of the rewrite pipeline on whole scripts

use pretty_assertions::assert_eq;

use rust_sqlsync::{process_script, run_pipeline, PipelineStats, SyncScriptError};

use crate::common::{created_names, dropped_names, load_fixture};

const FIXTURE: &str = "sqlpackage_sync_script.sql";

/// Definitions between two banners (or to the end) of a final script
fn section<'a>(script: &'a str, banner: &str) -> &'a str {
    let Some(start) = script.find(banner) else {
        return "";
    };
    let rest = &script[start + banner.len()..];
    let end = rest.find("\n-- ").map(|i| i + 1).unwrap_or(rest.len());
    &rest[..end]
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_round_trip_scenario() {
    let out = process_script("CREATE PROCEDURE [dbo].[GetUsers] AS BEGIN SELECT 1 END\nGO\n").unwrap();

    let drop = out.find("DROP PROCEDURE IF EXISTS [dbo].[GetUsers]\nGO\n").unwrap();
    let create = out
        .find("CREATE PROCEDURE [dbo].[GetUsers] AS BEGIN SELECT 1 END\nGO\n")
        .unwrap();
    let probe = out.find("IF OBJECT_ID('[dbo].[GetUsers]') IS NOT NULL").unwrap();
    let created = out
        .find("PRINT '<<< CREATED PROCEDURE [dbo].[GetUsers] >>>'")
        .unwrap();
    assert!(drop < create && create < probe && probe < created);
    assert!(out.ends_with("GO\n"));
}

#[test]
fn test_drop_scenario() {
    let raw = "PRINT N'Dropping Procedure [dbo].[OldProc]...'\nGO\nDROP PROCEDURE [dbo].[OldProc];\nGO\n";
    let out = process_script(raw).unwrap();
    assert_eq!(
        out,
        "-- DROP STATEMENTS --\n\nDROP PROCEDURE IF EXISTS [dbo].[OldProc];\nGO\n"
    );
}

#[test]
fn test_round_trip_scenario_on_one_line() {
    let out =
        process_script("CREATE PROCEDURE [dbo].[GetUsers] AS BEGIN SELECT 1 END GO").unwrap();

    assert!(out.contains(
        "DROP PROCEDURE IF EXISTS [dbo].[GetUsers]\nGO\n\
         CREATE PROCEDURE [dbo].[GetUsers] AS BEGIN SELECT 1 END\nGO\n"
    ));
    assert!(out.contains("PRINT '<<< CREATED PROCEDURE [dbo].[GetUsers] >>>'"));
    assert!(!out.contains("END GO"));
}

#[test]
fn test_drop_scenario_on_one_line() {
    let raw = "PRINT N'Dropping Procedure [dbo].[OldProc]...' GO DROP PROCEDURE [dbo].[OldProc]; GO";
    assert_eq!(
        process_script(raw).unwrap(),
        "-- DROP STATEMENTS --\n\nDROP PROCEDURE IF EXISTS [dbo].[OldProc];\nGO\n"
    );
}

#[test]
fn test_nested_comment_is_removed_from_body() {
    let raw = "ALTER PROCEDURE p AS\nBEGIN\nSELECT a /* x /* nested */ y */ b\nEND\nGO\n";
    let output = run_pipeline(raw).unwrap();
    assert_eq!(
        output.classified.procedures[0].body,
        "ALTER PROCEDURE p AS\nBEGIN\nSELECT a  b\nEND"
    );
}

#[test]
fn test_nested_comment_left_open_writes_nothing() {
    let raw = "ALTER PROCEDURE p AS\nBEGIN\nSELECT 1 /* /* */\nEND\nGO\n";
    let err = process_script(raw).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<SyncScriptError>(),
        Some(SyncScriptError::UnterminatedComment { .. })
    ));
}

#[test]
fn test_body_operators_and_literals_are_unchanged() {
    let raw = "ALTER PROCEDURE p AS\nBEGIN\nSELECT a<>b, a!=b, X'41', 0x1F\nEND\nGO\n";
    let out = process_script(raw).unwrap();
    assert!(out.contains("CREATE PROCEDURE p AS\nBEGIN\nSELECT a<>b, a!=b, X'41', 0x1F\nEND\nGO\n"));
}

#[test]
fn test_comment_stripping_scenario() {
    let raw = "-- Alter Procedure: [dbo].[Foo]\nALTER PROCEDURE [dbo].[Foo]\nAS\nBEGIN\n    SELECT 1\nEND\nGO\n";
    let output = run_pipeline(raw).unwrap();
    assert_eq!(output.classified.procedures.len(), 1);
    assert!(!output.verified.contains("Alter Procedure:"));
    assert!(output.verified.contains("CREATE PROCEDURE [dbo].[Foo]\nAS\nBEGIN"));
}

#[test]
fn test_noise_only_input_is_empty() {
    let raw = "PRINT N'Starting';\nGO\nPRINT N'Update complete.';\nGO\n\n";
    assert_eq!(process_script(raw).unwrap(), "");
}

// ============================================================================
// Properties
// ============================================================================

#[test]
fn test_second_pass_is_stable() {
    let raw = load_fixture(FIXTURE);
    let once = process_script(&raw).unwrap();
    let twice = process_script(&once).unwrap();
    assert_eq!(once, twice);
}

#[test]
fn test_every_object_appears_once_in_drop_then_create_form() {
    let out = process_script(&load_fixture(FIXTURE)).unwrap();
    let created = created_names(&out);

    let mut unique = created.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), created.len(), "duplicate definitions: {created:?}");

    for name in &created {
        let drop = out
            .find(&format!("IF EXISTS {name}\nGO\nCREATE "))
            .unwrap_or_else(|| panic!("no drop directly before create of {name}"));
        assert!(out[drop..].contains(&format!("IF OBJECT_ID('{name}') IS NOT NULL")));
    }
    assert!(!out.contains("ALTER PROCEDURE"));
    assert!(!out.contains("ALTER FUNCTION"));
}

#[test]
fn test_names_are_preserved_verbatim() {
    let out = process_script(&load_fixture(FIXTURE)).unwrap();
    let created = created_names(&out);
    let dropped = dropped_names(&out);

    assert_eq!(
        created,
        vec![
            "[dbo].[fn_OrderTotal]",
            "dbo.fn_FormatCustomer",
            "[dbo].[usp_ArchiveOrders]",
            "[dbo].[usp_GetOrders]",
        ]
    );
    for name in &created {
        assert!(dropped.contains(name), "{name} has no matching drop");
    }
}

#[test]
fn test_sections_are_ordered() {
    let out = process_script(&load_fixture(FIXTURE)).unwrap();
    let drops = out.find("-- DROP STATEMENTS --").unwrap();
    let functions = out.find("-- FUNCTIONS --").unwrap();
    let procedures = out.find("-- PROCEDURES --").unwrap();
    assert!(drops < functions && functions < procedures);
}

#[test]
fn test_fixture_sections_hold_the_expected_objects() {
    let output = run_pipeline(&load_fixture(FIXTURE)).unwrap();
    assert_eq!(
        output.stats(),
        PipelineStats {
            functions: 2,
            procedures: 2,
            drops: 2,
            duplicates_removed: 1,
            drops_superseded: 0,
        }
    );

    let drops = section(&output.verified, "-- DROP STATEMENTS --");
    assert_eq!(
        drops.trim(),
        "DROP PROCEDURE IF EXISTS [dbo].[usp_LegacyExport];\nGO\n\n\
         DROP FUNCTION IF EXISTS [dbo].[fn_OldTaxRate];\nGO"
    );

    // Table changes, SQLCMD directives and module refreshes never survive
    assert!(!output.verified.contains("DiscountCode] NVARCHAR"));
    assert!(!output.verified.contains(":setvar"));
    assert!(!output.verified.contains("sp_refreshsqlmodule"));
    assert!(!output.verified.contains("PRINT N'"));
}

#[test]
fn test_dedup_keeps_last_definition() {
    let output = run_pipeline(&load_fixture(FIXTURE)).unwrap();
    let procedures = section(&output.verified, "-- PROCEDURES --");
    assert_eq!(procedures.matches("CREATE PROCEDURE [dbo].[usp_GetOrders]").count(), 1);
    assert!(procedures.contains("o.DiscountCode"));
    assert!(
        procedures.find("usp_ArchiveOrders").unwrap() < procedures.find("usp_GetOrders").unwrap()
    );
}

#[test]
fn test_drop_superseded_when_object_is_recreated() {
    let raw = r#"DROP PROCEDURE [dbo].[Renamed];
GO
CREATE PROCEDURE [dbo].[Renamed] AS BEGIN SELECT 1 END
GO
"#;
    let output = run_pipeline(raw).unwrap();
    assert_eq!(output.stats().drops, 0);
    assert_eq!(output.stats().drops_superseded, 1);
    assert_eq!(dropped_names(&output.verified), vec!["[dbo].[Renamed]"]);
}
