use metaharvest::engine::{RecordSink, SqliteSink, open_sink};
use metaharvest::{Record, SinkFormat};
use std::fs;
use std::path::Path;

fn record<'a>(seq: u64, key: &'a str, field: &'a str, value: &'a str) -> Record<'a> {
    Record {
        seq,
        key,
        field,
        value,
    }
}

fn write_all(sink: &mut dyn RecordSink, records: &[Record<'_>]) {
    for r in records {
        sink.write_record(r).unwrap();
    }
    sink.close().unwrap();
}

fn count_rows(path: &Path) -> i64 {
    let conn = rusqlite::Connection::open(path).unwrap();
    conn.query_row("SELECT COUNT(*) FROM records", [], |r| r.get(0))
        .unwrap()
}

// --- csv ---

#[test]
fn test_csv_rows_are_quoted_as_needed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.csv");
    let mut sink = open_sink(SinkFormat::Csv, Some(path.as_path())).unwrap();
    write_all(
        sink.as_mut(),
        &[
            record(1, "a.jpg", "Make", "Canon, Inc."),
            record(1, "a.jpg", "Model", "EOS 5D"),
            record(2, "b.jpg", "Artist", "say \"hi\""),
        ],
    );
    assert_eq!(sink.destination(), path.display().to_string());
    drop(sink);

    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "1,a.jpg,Make,\"Canon, Inc.\"\n1,a.jpg,Model,EOS 5D\n2,b.jpg,Artist,\"say \"\"hi\"\"\"\n"
    );
}

#[test]
fn test_csv_appends_across_runs() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.csv");
    for _ in 0..2 {
        let mut sink = open_sink(SinkFormat::Csv, Some(path.as_path())).unwrap();
        write_all(sink.as_mut(), &[record(1, "a.jpg", "Make", "Canon")]);
    }
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "1,a.jpg,Make,Canon\n1,a.jpg,Make,Canon\n"
    );
}

#[test]
fn test_csv_record_is_on_disk_before_close() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.csv");
    let mut sink = open_sink(SinkFormat::Csv, Some(path.as_path())).unwrap();
    sink.write_record(&record(3, "c.jpg", "Make", "Nikon")).unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), "3,c.jpg,Make,Nikon\n");
}

// --- jsonl ---

#[test]
fn test_jsonl_one_object_per_line() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.jsonl");
    let mut sink = open_sink(SinkFormat::Jsonl, Some(path.as_path())).unwrap();
    write_all(
        sink.as_mut(),
        &[
            record(1, "a.jpg", "Make", "Canon, Inc."),
            record(2, "b.jpg", "Model", "line\nbreak"),
        ],
    );

    let text = fs::read_to_string(&path).unwrap();
    let lines: Vec<serde_json::Value> = text
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["seq"], 1);
    assert_eq!(lines[0]["key"], "a.jpg");
    assert_eq!(lines[0]["value"], "Canon, Inc.");
    assert_eq!(lines[1]["field"], "Model");
    assert_eq!(lines[1]["value"], "line\nbreak");
}

// --- sqlite ---

#[test]
fn test_sqlite_in_memory_rows() {
    let mut sink = SqliteSink::open_in_memory().unwrap();
    for r in [
        record(1, "a.jpg", "Make", "Canon"),
        record(1, "a.jpg", "Model", "EOS"),
        record(2, "b.jpg", "Make", "Nikon"),
    ] {
        sink.write_record(&r).unwrap();
    }
    assert_eq!(sink.destination(), ":memory:");

    let conn = sink.connection();
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM records WHERE key = 'a.jpg'", [], |r| {
            r.get(0)
        })
        .unwrap();
    assert_eq!(count, 2);
    let (seq, value): (i64, String) = conn
        .query_row(
            "SELECT seq, value FROM records WHERE key = 'b.jpg'",
            [],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .unwrap();
    assert_eq!((seq, value.as_str()), (2, "Nikon"));
    sink.close().unwrap();
}

#[test]
fn test_sqlite_file_appends_across_runs() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.db");
    for _ in 0..2 {
        let mut sink = open_sink(SinkFormat::Sqlite, Some(path.as_path())).unwrap();
        write_all(
            sink.as_mut(),
            &[
                record(1, "a.jpg", "Make", "Canon"),
                record(1, "a.jpg", "Model", "EOS"),
            ],
        );
    }
    assert_eq!(count_rows(&path), 4);
}

#[test]
fn test_sqlite_file_syncs_every_commit() {
    let dir = tempfile::tempdir().unwrap();
    let sink = SqliteSink::open(&dir.path().join("out.db")).unwrap();
    let conn = sink.connection();
    let mode: String = conn
        .query_row("PRAGMA journal_mode", [], |r| r.get(0))
        .unwrap();
    let synchronous: i64 = conn
        .query_row("PRAGMA synchronous", [], |r| r.get(0))
        .unwrap();
    assert_eq!(mode, "wal");
    // 2 = FULL
    assert_eq!(synchronous, 2);
}

// --- temp output ---

#[test]
fn test_temp_output_is_created_and_kept() {
    let mut sink = open_sink(SinkFormat::Csv, None).unwrap();
    write_all(sink.as_mut(), &[record(1, "a.jpg", "Make", "Canon")]);
    let dest = std::path::PathBuf::from(sink.destination());
    drop(sink);

    let name = dest.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("exif-data"), "{name}");
    assert!(name.ends_with(".csv"), "{name}");
    assert_eq!(fs::read_to_string(&dest).unwrap(), "1,a.jpg,Make,Canon\n");
    fs::remove_file(&dest).unwrap();
}
