use std::{fs, io::Write, os::unix::net::UnixStream};

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use super::*;
use crate::common::Paths;

fn setup(passwd: &str) -> (TempDir, Paths) {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("etc")).unwrap();
    fs::write(dir.path().join("etc/passwd.txt"), passwd).unwrap();
    let paths = Paths::new(dir.path());
    (dir, paths)
}

fn input(text: &str) -> LineReader<UnixStream> {
    let (rx, mut tx) = UnixStream::pair().unwrap();
    tx.write_all(text.as_bytes()).unwrap();
    LineReader::new(rx)
}

#[test]
fn entry_parsing() {
    assert_eq!(
        PasswdEntry::parse("alice:secret:/home/alice\n"),
        Some(PasswdEntry {
            name: "alice",
            password: "secret"
        })
    );
    assert_eq!(
        PasswdEntry::parse("bob:pw"),
        Some(PasswdEntry {
            name: "bob",
            password: "pw"
        })
    );
    assert_eq!(PasswdEntry::parse(""), None);
    assert_eq!(PasswdEntry::parse("nopassword"), None);
    assert_eq!(PasswdEntry::parse(":pw:/home"), None);
}

#[test]
fn password_must_belong_to_the_user() {
    let (_dir, paths) = setup("root:toor:/home/root\nalice:secret:/home/alice\n");
    let passwd = PasswdFile::new(paths.passwd_file());

    assert!(passwd.authenticate("alice", "secret").unwrap());
    assert!(passwd.authenticate("root", "toor").unwrap());
    // right password, wrong line
    assert!(!passwd.authenticate("alice", "toor").unwrap());
    assert!(!passwd.authenticate("mallory", "secret").unwrap());
}

#[test]
fn missing_passwd_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let passwd = PasswdFile::new(dir.path().join("etc/passwd.txt"));
    assert!(matches!(
        passwd.authenticate("root", "toor"),
        Err(Error::Io(Some(_), _))
    ));
}

#[test]
fn add_user_creates_entry_and_home() {
    let (_dir, paths) = setup("root:toor:/home/root");

    add_user(&paths, "carol", "hunter2").unwrap();

    let passwd = PasswdFile::new(paths.passwd_file());
    assert!(passwd.authenticate("carol", "hunter2").unwrap());
    assert!(passwd.authenticate("root", "toor").unwrap());
    assert_eq!(
        fs::read_to_string(paths.passwd_file()).unwrap(),
        "root:toor:/home/root\ncarol:hunter2:/home/carol\n"
    );
    assert!(paths.home_dir("carol").is_dir());
    assert_eq!(fs::read_to_string(paths.history_file("carol")).unwrap(), "");
}

#[test]
fn add_user_rejects_duplicates_and_bad_names() {
    let (_dir, paths) = setup("root:toor:/home/root\n");

    assert!(matches!(
        add_user(&paths, "root", "x"),
        Err(Error::UserExists(name)) if name == "root"
    ));
    assert!(matches!(
        add_user(&paths, "a:b", "x"),
        Err(Error::InvalidUserName(_))
    ));
    assert!(matches!(
        add_user(&paths, "../etc", "x"),
        Err(Error::InvalidUserName(_))
    ));
    assert!(add_user(&paths, "dave", "with space").is_err());
    assert_eq!(
        fs::read_to_string(paths.passwd_file()).unwrap(),
        "root:toor:/home/root\n"
    );
}

#[test]
fn login_retries_until_success() {
    let (_dir, paths) = setup("alice:secret:/home/alice\n");
    let passwd = PasswdFile::new(paths.passwd_file());

    let mut reader = input("alice\nwrong\n alice \nsecret\n");
    assert_eq!(
        login(&mut reader, &passwd).unwrap(),
        Some("alice".to_string())
    );
}

#[test]
fn login_can_be_abandoned() {
    let (_dir, paths) = setup("alice:secret:/home/alice\n");
    let passwd = PasswdFile::new(paths.passwd_file());

    assert_eq!(login(&mut input("quit\n"), &passwd).unwrap(), None);
    assert_eq!(login(&mut input("alice\nquit\n"), &passwd).unwrap(), None);

    let (rx, tx) = UnixStream::pair().unwrap();
    drop(tx);
    assert_eq!(login(&mut LineReader::new(rx), &passwd).unwrap(), None);
}
