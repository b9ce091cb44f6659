//! Packaging tests: staging, noise filtering and archive contents

use std::fs;
use std::io::{Cursor, Read};
use std::path::Path;

use paasctl::errors::CliError;
use paasctl::filesys::scratch::ScratchDir;
use paasctl::package::archive::build_archive;
use paasctl::package::exclusions::NoiseFilter;
use paasctl::package::stage::stage_application;
use paasctl::sync::reconciler::scan_tree;

fn write_file(root: &Path, rel: &str, content: &[u8]) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn archive_names(bytes: &[u8]) -> Vec<String> {
    let zip = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut names: Vec<String> = zip.file_names().map(str::to_string).collect();
    names.sort();
    names
}

fn read_entry(bytes: &[u8], name: &str) -> Vec<u8> {
    let mut zip = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut file = zip.by_name(name).unwrap();
    let mut content = Vec::new();
    file.read_to_end(&mut content).unwrap();
    content
}

/// Stage `src` into a fresh scratch directory and package everything in it
fn package(src: &Path) -> paasctl::package::archive::PackagedArchive {
    let scratch_root = tempfile::tempdir().unwrap();
    let scratch = ScratchDir::for_app("web", Some(scratch_root.path())).unwrap();
    stage_application(src, scratch.path()).unwrap();
    let entries = scan_tree(scratch.path()).unwrap();
    build_archive(&entries, &NoiseFilter::standard().unwrap()).unwrap()
}

#[test]
fn test_noise_filter_patterns() {
    let noise = NoiseFilter::standard().unwrap();

    for path in [
        ".git/HEAD",
        "vendor/lib/.git/config",
        ".svn/entries",
        "deep/.hg/store",
        "_darcs/prefs",
        "CVS/Root",
        "app.rb~",
        "#app.rb#",
        "lib/.#app.rb",
        ".app.rb.swp",
        "log/production.log",
    ] {
        assert!(noise.is_noise(path), "{} should be noise", path);
    }

    for path in ["app.rb", ".env", "logs/readme.txt", "Gemfile.lock", "git/notes"] {
        assert!(!noise.is_noise(path), "{} should be kept", path);
    }
}

#[test]
fn test_archive_holds_exactly_the_non_noise_files() {
    let src = tempfile::tempdir().unwrap();
    write_file(src.path(), "config.ru", b"run App");
    write_file(src.path(), "lib/app.rb", b"class App; end");
    write_file(src.path(), ".env", b"RACK_ENV=production");
    write_file(src.path(), "lib/app.rb~", b"backup");
    write_file(src.path(), "log/development.log", b"noise");
    write_file(src.path(), "vendor/gem/.svn/entries", b"svn");

    let archive = package(src.path());

    assert_eq!(
        archive_names(&archive.bytes),
        vec![".env", "config.ru", "lib/app.rb"]
    );
    assert_eq!(read_entry(&archive.bytes, "lib/app.rb"), b"class App; end");
    assert_eq!(archive.excluded.len(), 3);
}

#[test]
fn test_noise_only_tree_gives_empty_archive() {
    let src = tempfile::tempdir().unwrap();
    write_file(src.path(), "server.log", b"...");
    write_file(src.path(), "notes.txt~", b"...");
    write_file(src.path(), "CVS/Root", b"...");

    let archive = package(src.path());

    assert!(archive.is_empty());
    assert!(archive_names(&archive.bytes).is_empty());
}

#[test]
fn test_archive_is_deterministic() {
    let src = tempfile::tempdir().unwrap();
    write_file(src.path(), "b.txt", b"bravo");
    write_file(src.path(), "a.txt", b"alpha");
    write_file(src.path(), "sub/c.txt", b"charlie");

    let first = package(src.path());
    let second = package(src.path());

    assert_eq!(first.entries, vec!["a.txt", "b.txt", "sub/c.txt"]);
    assert_eq!(first.bytes, second.bytes);
}

#[test]
fn test_packaging_an_archive_file() {
    let src = tempfile::tempdir().unwrap();
    let jar = src.path().join("service.jar");
    {
        let mut writer = zip::ZipWriter::new(fs::File::create(&jar).unwrap());
        writer
            .start_file("META-INF/MANIFEST.MF", zip::write::SimpleFileOptions::default())
            .unwrap();
        std::io::Write::write_all(&mut writer, b"Main-Class: App\n").unwrap();
        writer
            .start_file("App.class", zip::write::SimpleFileOptions::default())
            .unwrap();
        std::io::Write::write_all(&mut writer, b"\xca\xfe\xba\xbe").unwrap();
        writer.finish().unwrap();
    }

    let archive = package(&jar);

    assert_eq!(
        archive_names(&archive.bytes),
        vec!["App.class", "META-INF/MANIFEST.MF"]
    );
}

#[test]
fn test_scratch_directory_is_removed() {
    let root = tempfile::tempdir().unwrap();
    let path = {
        let scratch = ScratchDir::for_app("web", Some(root.path())).unwrap();
        write_file(scratch.path(), "leftover.txt", b"x");
        scratch.path().to_path_buf()
    };

    assert!(path
        .file_name()
        .unwrap()
        .to_string_lossy()
        .starts_with(".paasctl_web_"));
    assert!(!path.exists());
}

#[test]
fn test_concurrent_pushes_of_one_app_stage_separately() {
    let root = tempfile::tempdir().unwrap();
    let src = tempfile::tempdir().unwrap();
    write_file(src.path(), "app.rb", b"puts 1");

    let first = ScratchDir::for_app("web", Some(root.path())).unwrap();
    stage_application(src.path(), first.path()).unwrap();

    let second = ScratchDir::for_app("web", Some(root.path())).unwrap();
    stage_application(src.path(), second.path()).unwrap();
    drop(second);

    let entries = scan_tree(first.path()).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].relative_path, "app.rb");
}

#[cfg(unix)]
#[test]
fn test_link_outside_root_fails() {
    let outside = tempfile::tempdir().unwrap();
    let src = tempfile::tempdir().unwrap();
    write_file(outside.path(), "passwd", b"root");
    write_file(src.path(), "app.rb", b"");
    std::os::unix::fs::symlink(outside.path().join("passwd"), src.path().join("passwd")).unwrap();

    let scratch_root = tempfile::tempdir().unwrap();
    let scratch = ScratchDir::for_app("web", Some(scratch_root.path())).unwrap();

    assert!(matches!(
        stage_application(src.path(), scratch.path()),
        Err(CliError::UnreachableLink { .. })
    ));
}

#[cfg(unix)]
#[test]
fn test_link_inside_root_is_copied_as_file() {
    let src = tempfile::tempdir().unwrap();
    write_file(src.path(), "shared/settings.yml", b"env: prod");
    std::os::unix::fs::symlink(
        src.path().join("shared/settings.yml"),
        src.path().join("settings.yml"),
    )
    .unwrap();

    let archive = package(src.path());

    assert_eq!(
        archive_names(&archive.bytes),
        vec!["settings.yml", "shared/settings.yml"]
    );
    assert_eq!(read_entry(&archive.bytes, "settings.yml"), b"env: prod");
}
