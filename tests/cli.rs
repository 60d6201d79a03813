use assert_cmd::Command;
use predicates::prelude::*;

fn tubemirror() -> Command {
    Command::cargo_bin("tubemirror").unwrap()
}

#[test]
fn help_lists_subcommands() {
    tubemirror()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("download"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn download_help_shows_options() {
    tubemirror()
        .args(["download", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--output-dir"))
        .stdout(predicate::str::contains("--delay"))
        .stdout(predicate::str::contains("--no-sync"));
}

#[test]
fn download_requires_url() {
    tubemirror()
        .arg("download")
        .assert()
        .failure()
        .stderr(predicate::str::contains("<URL>"));
}

#[test]
fn delay_must_be_a_number() {
    tubemirror()
        .args(["download", "https://youtu.be/abc", "--delay", "soon"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

/// A PATH holding only a stand-in `yt-dlp` that answers `--version` and fails everything else
#[cfg(unix)]
fn path_with_fake_yt_dlp(dir: &std::path::Path) -> std::path::PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let bin = dir.join("bin");
    std::fs::create_dir_all(&bin).unwrap();
    let script = bin.join("yt-dlp");
    std::fs::write(
        &script,
        "#!/bin/sh\nif [ \"$1\" = \"--version\" ]; then echo 2024.01.01; exit 0; fi\necho 'ERROR: offline' >&2\nexit 1\n",
    )
    .unwrap();
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
    bin
}

#[cfg(unix)]
#[test]
fn missing_optional_tools_are_logged_as_warnings() {
    let dir = tempfile::tempdir().unwrap();
    let bin = path_with_fake_yt_dlp(dir.path());

    tubemirror()
        .current_dir(dir.path())
        .env_clear()
        .env("PATH", &bin)
        .env("HOME", dir.path())
        .env("XDG_CONFIG_HOME", dir.path().join("config"))
        .args([
            "download",
            "https://www.youtube.com/watch?v=abc",
            "--output-dir",
        ])
        .arg(dir.path().join("downloads"))
        .arg("--no-notify")
        .assert()
        .success()
        .stdout(predicate::str::contains("Missing dependency: ffmpeg"))
        .stdout(predicate::str::contains("rsync - required for remote sync"))
        .stdout(predicate::str::contains("Detected single video URL"))
        .stdout(predicate::str::contains("Download failed"));
}
