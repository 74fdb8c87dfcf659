//! File-level workflow tests: offline rewrite and the SqlPackage-driven sync

use pretty_assertions::assert_eq;

use rust_sqlsync::{
    rewrite_script_file, RewriteOptions, SyncScriptError, CLEANED_SCRIPT_NAME,
    FILTERED_SCRIPT_NAME,
};

use crate::common::TestContext;

const FIXTURE: &str = "sqlpackage_sync_script.sql";

#[test]
fn test_rewrite_writes_final_and_intermediate_scripts() {
    let (ctx, input) = TestContext::with_fixture(FIXTURE);
    let output_path = ctx.dir.join("out").join("storedProcedures.sql");

    let report = rewrite_script_file(RewriteOptions {
        input_path: input,
        output_path: output_path.clone(),
        intermediates_dir: Some(ctx.dir.join("out")),
        verbose: false,
    })
    .unwrap();

    assert_eq!(report.final_path, output_path);
    assert_eq!(report.stats.procedures, 2);
    assert!(report.final_size < report.raw_size);

    let final_script = ctx.read("out/storedProcedures.sql");
    assert_eq!(final_script.len() as u64, report.final_size);
    assert!(final_script.starts_with("-- DROP STATEMENTS --"));

    let cleaned = ctx.read(format!("out/{CLEANED_SCRIPT_NAME}"));
    assert!(!cleaned.contains("PRINT N'Altering"));
    assert!(cleaned.contains("ALTER TABLE [dbo].[Orders]"));

    let filtered = ctx.read(format!("out/{FILTERED_SCRIPT_NAME}"));
    assert!(filtered.contains("ALTER PROCEDURE [dbo].[usp_GetOrders]"));
    assert!(!filtered.contains("ALTER TABLE"));
}

#[test]
fn test_rewrite_reads_bom_and_windows_1252() {
    let ctx = TestContext::new();
    let input = ctx.dir.join("cp1252.sql");
    // A BOM followed by Windows-1252 bytes that are not valid UTF-8
    let script: &[u8] = b"ALTER PROCEDURE [dbo].[Caf\xe9] AS BEGIN SELECT 'na\xefve' END\nGO\n";
    let bytes = [&[0xEF, 0xBB, 0xBF][..], script].concat();
    std::fs::write(&input, &bytes).unwrap();

    let report = rewrite_script_file(RewriteOptions {
        input_path: input,
        output_path: ctx.dir.join("final.sql"),
        intermediates_dir: None,
        verbose: false,
    })
    .unwrap();

    assert_eq!(report.stats.procedures, 1);
    let final_script = ctx.read("final.sql");
    assert!(final_script.contains("SELECT 'naïve'"));
    assert!(!ctx.dir.join(CLEANED_SCRIPT_NAME).exists());
}

#[test]
fn test_rewrite_missing_input_is_read_error() {
    let ctx = TestContext::new();
    let err = rewrite_script_file(RewriteOptions {
        input_path: ctx.dir.join("missing.sql"),
        output_path: ctx.dir.join("final.sql"),
        intermediates_dir: None,
        verbose: false,
    })
    .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<SyncScriptError>(),
        Some(SyncScriptError::ScriptReadError { .. })
    ));
    assert!(!ctx.dir.join("final.sql").exists());
}

#[test]
fn test_rewrite_unterminated_comment_writes_nothing() {
    let ctx = TestContext::new();
    let input = ctx.write_script(
        "broken.sql",
        "ALTER PROCEDURE p AS BEGIN SELECT 1 END\nGO\n/* never closed\nALTER PROCEDURE q AS BEGIN SELECT 2 END\nGO\n",
    );

    let err = rewrite_script_file(RewriteOptions {
        input_path: input,
        output_path: ctx.dir.join("final.sql"),
        intermediates_dir: Some(ctx.dir.clone()),
        verbose: false,
    })
    .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<SyncScriptError>(),
        Some(SyncScriptError::UnterminatedComment { .. })
    ));
    assert!(!ctx.dir.join("final.sql").exists());
    assert!(!ctx.dir.join(CLEANED_SCRIPT_NAME).exists());
}

#[test]
fn test_rewrite_failed_final_write_leaves_no_intermediates() {
    let (ctx, input) = TestContext::with_fixture(FIXTURE);
    // A directory where the final script should go makes the write fail
    let output_path = ctx.dir.join("final.sql");
    std::fs::create_dir(&output_path).unwrap();

    let err = rewrite_script_file(RewriteOptions {
        input_path: input,
        output_path,
        intermediates_dir: Some(ctx.dir.join("work")),
        verbose: false,
    })
    .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<SyncScriptError>(),
        Some(SyncScriptError::ScriptWriteError { .. })
    ));
    assert!(!ctx.dir.join("work").join(CLEANED_SCRIPT_NAME).exists());
    assert!(!ctx.dir.join("work").join(FILTERED_SCRIPT_NAME).exists());
    assert!(!ctx.dir.join(".final.sql.tmp").exists());
}

#[cfg(unix)]
mod sync {
    use super::*;
    use pretty_assertions::assert_eq;
    use crate::common::fixture_path;
    use rust_sqlsync::{generate_sync_script, SyncConfig, SyncOptions, RAW_SCRIPT_NAME};

    fn config(ctx: &TestContext, sqlpackage: std::path::PathBuf) -> SyncConfig {
        SyncConfig {
            server: "db.local".to_string(),
            username: "deploy".to_string(),
            password: "s3cret".to_string(),
            source_db: "SalesDev".to_string(),
            target_db: "SalesProd".to_string(),
            sqlpackage_path: sqlpackage,
            final_script_name: "storedProcedures.sql".to_string(),
            output_dir: ctx.dir.join("output"),
        }
    }

    #[test]
    fn test_sync_runs_sqlpackage_and_rewrites_its_script() {
        let ctx = TestContext::new();
        let sqlpackage = ctx.fake_sqlpackage(&fixture_path(FIXTURE), 0);

        let report = generate_sync_script(SyncOptions {
            config: config(&ctx, sqlpackage),
            write_intermediates: true,
            verbose: false,
        })
        .unwrap();

        assert_eq!(report.final_path, ctx.dir.join("output").join("storedProcedures.sql"));
        assert!(ctx.dir.join("output").join("SalesDev.dacpac").exists());
        assert!(ctx.dir.join("output").join(RAW_SCRIPT_NAME).exists());
        assert!(ctx.dir.join("output").join(CLEANED_SCRIPT_NAME).exists());
        assert!(ctx.dir.join("output").join(FILTERED_SCRIPT_NAME).exists());
        assert!(ctx.read("output/storedProcedures.sql").contains("-- PROCEDURES --"));
    }

    #[test]
    fn test_sync_stops_when_sqlpackage_fails() {
        let ctx = TestContext::new();
        let sqlpackage = ctx.fake_sqlpackage(&fixture_path(FIXTURE), 1);

        let err = generate_sync_script(SyncOptions {
            config: config(&ctx, sqlpackage),
            write_intermediates: true,
            verbose: false,
        })
        .unwrap_err();

        match err.downcast_ref::<SyncScriptError>() {
            Some(SyncScriptError::SqlPackageFailed {
                action,
                code,
                diagnostics,
            }) => {
                assert_eq!(action, "Extract");
                assert_eq!(code, "1");
                assert!(diagnostics.contains("Could not deploy package"));
            }
            other => panic!("expected SqlPackageFailed, got {other:?}"),
        }
        assert!(!ctx.dir.join("output").join("storedProcedures.sql").exists());
    }
}
