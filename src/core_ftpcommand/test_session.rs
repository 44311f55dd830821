// Protocol tests: full sessions driven over an in-memory stream

use crate::core_sandbox::Sandbox;
use crate::session::{Session, SessionError, SessionOptions};
use std::path::Path;
use tempfile::TempDir;
use tokio::io::{duplex, AsyncReadExt, AsyncWriteExt, DuplexStream};
use tokio::task::JoinHandle;

struct Client {
    stream: DuplexStream,
    session: JoinHandle<Result<(), SessionError>>,
}

impl Client {
    async fn connect(root: &Path, require_account_and_password: bool) -> Self {
        let (client_side, server_side) = duplex(64 * 1024);
        let sandbox = Sandbox::new(root).unwrap();
        let options = SessionOptions {
            hostname: String::from("testhost"),
            peer: String::from("test-peer"),
            require_account_and_password,
            receive_buffer_size: 1024,
            transfer_buffer_size: 1024,
        };
        let session = tokio::spawn(async move {
            let mut session = Session::new(server_side, sandbox, options);
            session.run().await
        });

        let mut client = Client {
            stream: client_side,
            session,
        };
        assert_eq!(client.read_reply().await, "+testhost SFTP Service");
        client
    }

    async fn logged_in(root: &Path) -> Self {
        let mut client = Client::connect(root, false).await;
        assert_eq!(client.send("USER bob").await, "!bob logged in");
        client
    }

    async fn read_reply(&mut self) -> String {
        let mut reply = Vec::new();
        loop {
            let byte = self.stream.read_u8().await.unwrap();
            if byte == 0 {
                break;
            }
            reply.push(byte);
        }
        String::from_utf8(reply).unwrap()
    }

    async fn send(&mut self, line: &str) -> String {
        self.stream.write_all(line.as_bytes()).await.unwrap();
        self.read_reply().await
    }

    async fn read_payload(&mut self, size: usize) -> Vec<u8> {
        let mut payload = vec![0; size];
        self.stream.read_exact(&mut payload).await.unwrap();
        payload
    }
}

fn server_root() -> TempDir {
    let tmp = TempDir::new().unwrap();
    std::fs::create_dir(tmp.path().join("sub")).unwrap();
    std::fs::write(tmp.path().join("sub").join("inner.txt"), "inner").unwrap();
    tmp
}

#[tokio::test]
async fn test_login_type_and_empty_listing() {
    let tmp = TempDir::new().unwrap();
    let mut client = Client::connect(tmp.path(), false).await;

    assert_eq!(client.send("USER bob").await, "!bob logged in");
    assert_eq!(client.send("TYPE A").await, "+Using Ascii mode");
    assert_eq!(client.send("LIST F").await, "+/\r\n");
}

#[tokio::test]
async fn test_unknown_command() {
    let tmp = TempDir::new().unwrap();
    let mut client = Client::connect(tmp.path(), false).await;

    assert_eq!(client.send("QUIT").await, "-Invalid command");
    assert_eq!(client.send("TOBE x").await, "-Invalid command");
    assert_eq!(client.send("   ").await, "-Invalid command");
}

#[tokio::test]
async fn test_commands_require_login() {
    let tmp = server_root();
    let mut client = Client::connect(tmp.path(), true).await;

    for line in ["TYPE A", "LIST F", "CDIR sub", "KILL x", "NAME x", "RETR x", "STOR NEW x"] {
        assert_eq!(client.send(line).await, "-User not logged", "{}", line);
    }
    assert!(tmp.path().join("sub").exists());
}

#[tokio::test]
async fn test_insufficient_arguments() {
    let tmp = server_root();
    let mut client = Client::connect(tmp.path(), false).await;

    assert_eq!(
        client.send("USER").await,
        "-Insufficient arguments for command USER"
    );
    assert_eq!(client.send("USER bob").await, "!bob logged in");

    for verb in ["ACCT", "PASS", "TYPE", "LIST", "CDIR", "KILL", "NAME", "RETR", "STOR"] {
        assert_eq!(
            client.send(verb).await,
            format!("-Insufficient arguments for command {}", verb)
        );
    }

    // Nothing changed along the way.
    assert_eq!(client.send("LIST F").await, "+/\r\nsub\r\n");
    assert!(tmp.path().join("sub").join("inner.txt").exists());
}

#[tokio::test]
async fn test_full_login_in_any_order_is_monotonic() {
    let tmp = TempDir::new().unwrap();
    let mut client = Client::connect(tmp.path(), true).await;

    assert_eq!(
        client.send("PASS secret").await,
        "+Send user-id and account"
    );
    assert_eq!(
        client.send("USER bob").await,
        "+User-id valid, send account"
    );
    assert_eq!(client.send("ACCT billing").await, "!Account valid, logged in");

    assert_eq!(client.send("USER mallory").await, "!bob logged in");
    assert_eq!(client.send("PASS other").await, "!Logged in");
    assert_eq!(client.send("TYPE C").await, "+Using Continuous mode");
}

#[tokio::test]
async fn test_user_first_asks_for_account_and_password() {
    let tmp = TempDir::new().unwrap();
    let mut client = Client::connect(tmp.path(), true).await;

    assert_eq!(
        client.send("USER bob").await,
        "+User-id valid, send account and password"
    );
    assert_eq!(client.send("ACCT a").await, "+Account valid, send password");
    assert_eq!(client.send("PASS p").await, "!Logged in");
}

#[tokio::test]
async fn test_type_rejects_unknown_mode() {
    let tmp = TempDir::new().unwrap();
    let mut client = Client::logged_in(tmp.path()).await;

    assert_eq!(client.send("TYPE I").await, "-Type not valid");
    assert_eq!(client.send("type b").await, "+Using Binary mode");
}

#[tokio::test]
async fn test_cdir_parent_of_root_is_rejected() {
    let tmp = server_root();
    let mut client = Client::logged_in(tmp.path()).await;

    assert_eq!(
        client.send("CDIR ..").await,
        "-Can't connect to directory because: directory out of server scope"
    );
    assert_eq!(client.send("LIST F").await, "+/\r\nsub\r\n");
}

#[tokio::test]
async fn test_cdir_navigation() {
    let tmp = server_root();
    std::fs::create_dir(tmp.path().join("my docs")).unwrap();
    let mut client = Client::logged_in(tmp.path()).await;

    assert_eq!(client.send("CDIR sub").await, "!Changed working dir to /sub");
    assert_eq!(
        client.send("CDIR .").await,
        "-Can't connect to directory because: tried to change to current directory"
    );
    assert_eq!(
        client.send("CDIR nowhere").await,
        "-Can't connect to directory because: directory \"nowhere\" doesn't exist"
    );
    assert_eq!(
        client.send("CDIR inner.txt").await,
        "-Can't connect to directory because: directory \"inner.txt\" doesn't exist"
    );
    assert_eq!(client.send("CDIR ..").await, "!Changed working dir to /");
    assert_eq!(
        client.send("CDIR my docs").await,
        "!Changed working dir to /my docs"
    );
    assert_eq!(client.send("CDIR /sub").await, "!Changed working dir to /sub");
    assert_eq!(
        client.send("CDIR ../../..").await,
        "-Can't connect to directory because: directory out of server scope"
    );
}

#[tokio::test]
async fn test_cdir_waits_for_account_and_password() {
    let tmp = server_root();
    let mut client = Client::connect(tmp.path(), true).await;

    assert_eq!(
        client.send("USER bob").await,
        "+User-id valid, send account and password"
    );
    assert_eq!(
        client.send("CDIR sub").await,
        "+directory ok, send account and password"
    );
    assert_eq!(
        client.send("ACCT").await,
        "-Insufficient arguments for command ACCT"
    );
    assert_eq!(client.send("ACCT a").await, "+Account valid, send password");
    assert_eq!(client.send("PASS p").await, "!Changed working dir to /sub");
    assert_eq!(client.send("LIST F").await, "+/sub\r\ninner.txt\r\n");
}

#[tokio::test]
async fn test_cdir_wait_cancelled_by_other_command() {
    let tmp = server_root();
    let mut client = Client::connect(tmp.path(), true).await;

    client.send("USER bob").await;
    assert_eq!(
        client.send("CDIR sub").await,
        "+directory ok, send account and password"
    );
    // TYPE leaves the wait and is dispatched normally, still not logged in.
    assert_eq!(client.send("TYPE A").await, "-User not logged");
    assert_eq!(client.send("ACCT a").await, "+Account valid, send password");
    assert_eq!(client.send("PASS p").await, "!Logged in");
    assert_eq!(client.send("LIST F").await, "+/\r\nsub\r\n");
}

#[tokio::test]
async fn test_cdir_without_user_id_is_refused() {
    let tmp = server_root();
    let mut client = Client::connect(tmp.path(), true).await;

    assert_eq!(client.send("CDIR sub").await, "-User not logged");
}

#[tokio::test]
async fn test_list_with_paths() {
    let tmp = server_root();
    let mut client = Client::logged_in(tmp.path()).await;

    assert_eq!(client.send("LIST F sub").await, "+/sub\r\ninner.txt\r\n");
    assert_eq!(
        client.send("LIST F ../elsewhere").await,
        "-Directory out of server scope"
    );
    assert_eq!(
        client.send("LIST F missing dir").await,
        "-The directory missing dir does not exist in current path"
    );
    assert_eq!(
        client.send("LIST X").await,
        "-Invalid command. The format for this command is: LIST { F | V } directory path"
    );
    // Listing another directory does not move the session.
    assert_eq!(client.send("LIST F").await, "+/\r\nsub\r\n");
}

#[tokio::test]
async fn test_list_verbose() {
    let tmp = server_root();
    std::fs::write(tmp.path().join("a.txt"), "a").unwrap();
    let mut client = Client::logged_in(tmp.path()).await;

    let reply = client.send("LIST V").await;
    let lines: Vec<&str> = reply.split("\r\n").filter(|l| !l.is_empty()).collect();
    assert_eq!(lines[0], "+/");
    assert!(lines[1].starts_with("TYPE"));
    assert!(lines[1].contains("LAST ACCESSED"));
    assert!(lines[2].starts_with("FOLDER") && lines[2].ends_with("sub"));
    assert!(lines[3].starts_with("FILE") && lines[3].ends_with("a.txt"));
    assert_eq!(lines.len(), 4);
}

#[tokio::test]
async fn test_kill() {
    let tmp = server_root();
    std::fs::write(tmp.path().join("a.txt"), "a").unwrap();
    let mut client = Client::logged_in(tmp.path()).await;

    assert_eq!(client.send("KILL a.txt").await, "+a.txt deleted");
    assert!(!tmp.path().join("a.txt").exists());
    assert_eq!(
        client.send("KILL a.txt").await,
        "-Not deleted because: file doesn't exist"
    );
    assert_eq!(
        client.send("KILL sub").await,
        "-Not deleted because: it is a directory"
    );

    client.send("CDIR sub").await;
    std::fs::write(tmp.path().join("outside.txt"), "x").unwrap();
    assert_eq!(
        client.send("KILL ../outside.txt").await,
        "-Not deleted because: file is out of current directory scope"
    );
    assert!(tmp.path().join("outside.txt").exists());
}

#[tokio::test]
async fn test_name_then_tobe() {
    let tmp = server_root();
    std::fs::write(tmp.path().join("a.txt"), "content").unwrap();
    let mut client = Client::logged_in(tmp.path()).await;

    assert_eq!(client.send("NAME a.txt").await, "+File Exists");
    assert_eq!(client.send("TOBE b.txt").await, "+a.txt renamed to b.txt");
    assert!(!tmp.path().join("a.txt").exists());
    assert!(tmp.path().join("b.txt").exists());

    // Still waiting: a second TOBE renames again.
    assert_eq!(client.send("TOBE").await, "-No name received");
    assert_eq!(client.send("TOBE c d.txt").await, "+b.txt renamed to c d.txt");
    assert_eq!(
        std::fs::read_to_string(tmp.path().join("c d.txt")).unwrap(),
        "content"
    );

    // Any other command ends the wait and runs normally.
    assert_eq!(client.send("TYPE A").await, "+Using Ascii mode");
    assert_eq!(client.send("TOBE e.txt").await, "-Invalid command");
}

#[tokio::test]
async fn test_name_failures() {
    let tmp = server_root();
    std::fs::write(tmp.path().join("a.txt"), "a").unwrap();
    std::fs::write(tmp.path().join("taken.txt"), "t").unwrap();
    let mut client = Client::logged_in(tmp.path()).await;

    assert_eq!(client.send("NAME nosuch.txt").await, "-Can't find nosuch.txt");
    assert_eq!(client.send("NAME ../a.txt").await, "-Can't find ../a.txt");

    assert_eq!(client.send("NAME a.txt").await, "+File Exists");
    assert_eq!(
        client.send("TOBE taken.txt").await,
        "-File wasn't renamed because: taken.txt already exists"
    );
    assert_eq!(
        client.send("TOBE ../escape.txt").await,
        "-File wasn't renamed because: new name is out of current directory scope"
    );
    assert!(tmp.path().join("a.txt").exists());
    assert_eq!(client.send("DONE").await, "+Ended connection to testhost");
}

#[tokio::test]
async fn test_retr_missing_file() {
    let tmp = server_root();
    let mut client = Client::logged_in(tmp.path()).await;

    assert_eq!(client.send("RETR nosuchfile.txt").await, "-File doesn't exist");
    // No size line is pending: the next reply belongs to the next command.
    assert_eq!(client.send("TYPE B").await, "+Using Binary mode");
    assert_eq!(client.send("RETR sub").await, "-File doesn't exist");
    assert_eq!(client.send("RETR ../../x").await, "-File out of server scope");
}

#[tokio::test]
async fn test_retr_empty_file() {
    let tmp = server_root();
    std::fs::write(tmp.path().join("empty.txt"), "").unwrap();
    let mut client = Client::logged_in(tmp.path()).await;

    assert_eq!(
        client.send("RETR empty.txt").await,
        "-File is empty, aborting connection"
    );
}

#[tokio::test]
async fn test_retr_send() {
    let tmp = server_root();
    let content: Vec<u8> = (0..3000u32).map(|i| (i * 7 % 256) as u8).collect();
    std::fs::write(tmp.path().join("my data.bin"), &content).unwrap();
    let mut client = Client::logged_in(tmp.path()).await;

    assert_eq!(client.send("RETR my data.bin").await, "3000");
    client.stream.write_all(b"SEND").await.unwrap();
    assert_eq!(client.read_payload(3000).await, content);
    assert_eq!(client.read_reply().await, "+Finished file transfer");
}

#[tokio::test]
async fn test_retr_ascii_mode() {
    let tmp = server_root();
    std::fs::write(tmp.path().join("note.txt"), "na\u{ef}ve\n").unwrap();
    let mut client = Client::logged_in(tmp.path()).await;

    assert_eq!(client.send("TYPE A").await, "+Using Ascii mode");
    assert_eq!(client.send("RETR note.txt").await, "7");
    client.stream.write_all(b"SEND").await.unwrap();
    assert_eq!(client.read_payload(7).await, b"na??ve\n");
    assert_eq!(client.read_reply().await, "+Finished file transfer");
}

#[tokio::test]
async fn test_retr_stop_and_unexpected() {
    let tmp = server_root();
    let mut client = Client::logged_in(tmp.path()).await;

    assert_eq!(client.send("CDIR sub").await, "!Changed working dir to /sub");
    assert_eq!(client.send("RETR inner.txt").await, "5");
    assert_eq!(client.send("STOP").await, "+ok, RETR aborted");
    assert_eq!(client.send("RETR inner.txt").await, "5");
    assert_eq!(
        client.send("LIST F").await,
        "-Unexpected command, RETR aborted"
    );
}

#[tokio::test]
async fn test_stor_then_retr_round_trip() {
    let tmp = server_root();
    let content: Vec<u8> = (0..2500u32).map(|i| (i % 251) as u8).collect();
    let mut client = Client::logged_in(tmp.path()).await;

    assert_eq!(
        client.send("STOR NEW up.bin").await,
        "+File does not exist, will create new file"
    );
    assert_eq!(client.send("SIZE 2500").await, "+ok, waiting for file");
    client.stream.write_all(&content).await.unwrap();
    assert_eq!(client.read_reply().await, "+Saved up.bin");
    assert_eq!(std::fs::read(tmp.path().join("up.bin")).unwrap(), content);

    assert_eq!(client.send("RETR up.bin").await, "2500");
    client.stream.write_all(b"SEND").await.unwrap();
    assert_eq!(client.read_payload(2500).await, content);
    assert_eq!(client.read_reply().await, "+Finished file transfer");
}

#[tokio::test]
async fn test_stor_modes() {
    let tmp = server_root();
    std::fs::write(tmp.path().join("log.txt"), "one;").unwrap();
    let mut client = Client::logged_in(tmp.path()).await;

    assert_eq!(
        client.send("STOR NEW log.txt").await,
        "-File exists, but system doesn't support generations"
    );

    assert_eq!(client.send("STOR APP log.txt").await, "+Will append to file");
    assert_eq!(client.send("SIZE 4").await, "+ok, waiting for file");
    client.stream.write_all(b"two;").await.unwrap();
    assert_eq!(client.read_reply().await, "+Saved log.txt");
    assert_eq!(
        std::fs::read_to_string(tmp.path().join("log.txt")).unwrap(),
        "one;two;"
    );

    assert_eq!(client.send("STOR OLD log.txt").await, "+Will write over old file");
    assert_eq!(client.send("SIZE 3").await, "+ok, waiting for file");
    client.stream.write_all(b"new").await.unwrap();
    assert_eq!(client.read_reply().await, "+Saved log.txt");
    assert_eq!(
        std::fs::read_to_string(tmp.path().join("log.txt")).unwrap(),
        "new"
    );

    assert_eq!(client.send("STOR OLD fresh.txt").await, "+Will create new file");
    assert_eq!(client.send("SIZE 0").await, "+ok, waiting for file");
    assert_eq!(client.read_reply().await, "+Saved fresh.txt");
    assert!(tmp.path().join("fresh.txt").exists());
}

#[tokio::test]
async fn test_stor_rejections() {
    let tmp = server_root();
    let mut client = Client::logged_in(tmp.path()).await;

    assert_eq!(client.send("STOR XYZ f.txt").await, "-Invalid STOR mode");
    assert_eq!(
        client.send("STOR NEW").await,
        "-Insufficient arguments for command STOR"
    );
    assert_eq!(
        client.send("STOR NEW ../../f.txt").await,
        "-File out of server scope"
    );

    assert_eq!(
        client.send("STOR NEW f.txt").await,
        "+File does not exist, will create new file"
    );
    assert_eq!(client.send("SIZE lots").await, "-Invalid file size");

    assert_eq!(
        client.send("STOR NEW f.txt").await,
        "+File does not exist, will create new file"
    );
    assert_eq!(
        client.send("TYPE A").await,
        "-Unexpected command, STOR aborted"
    );
    assert!(!tmp.path().join("f.txt").exists());
}

#[tokio::test]
async fn test_done_ends_session() {
    let tmp = TempDir::new().unwrap();
    let mut client = Client::connect(tmp.path(), true).await;

    // DONE needs neither login nor arguments.
    assert_eq!(client.send("DONE").await, "+Ended connection to testhost");

    let mut rest = Vec::new();
    client.stream.read_to_end(&mut rest).await.unwrap();
    assert!(rest.is_empty());
    assert!(client.session.await.unwrap().is_ok());
}

#[tokio::test]
async fn test_peer_disconnect_is_not_an_error() {
    let tmp = TempDir::new().unwrap();
    let mut client = Client::connect(tmp.path(), false).await;
    assert_eq!(client.send("USER bob").await, "!bob logged in");

    let Client { stream, session } = client;
    drop(stream);
    assert!(session.await.unwrap().is_ok());
}

#[tokio::test]
async fn test_line_terminators_are_ignored() {
    let tmp = TempDir::new().unwrap();
    let mut client = Client::connect(tmp.path(), false).await;

    assert_eq!(client.send("USER bob\r\n").await, "!bob logged in");
    assert_eq!(client.send("TYPE A\0").await, "+Using Ascii mode");
}

#[cfg(unix)]
#[tokio::test]
async fn test_stor_through_link_leaving_root_is_refused() {
    let tmp = server_root();
    let outside = TempDir::new().unwrap();
    std::os::unix::fs::symlink(outside.path(), tmp.path().join("link")).unwrap();
    let mut client = Client::logged_in(tmp.path()).await;

    assert_eq!(
        client.send("STOR NEW link/escaped.txt").await,
        "-File out of server scope"
    );
    assert_eq!(
        client.send("STOR APP link/deeper/escaped.txt").await,
        "-File out of server scope"
    );
    assert_eq!(std::fs::read_dir(outside.path()).unwrap().count(), 0);
}

#[cfg(unix)]
#[tokio::test]
async fn test_tobe_through_link_leaving_root_is_refused() {
    let tmp = server_root();
    let outside = TempDir::new().unwrap();
    std::os::unix::fs::symlink(outside.path(), tmp.path().join("link")).unwrap();
    std::fs::write(tmp.path().join("a.txt"), "a").unwrap();
    let mut client = Client::logged_in(tmp.path()).await;

    assert_eq!(client.send("NAME a.txt").await, "+File Exists");
    assert_eq!(
        client.send("TOBE link/moved.txt").await,
        "-File wasn't renamed because: new name is out of current directory scope"
    );
    assert!(tmp.path().join("a.txt").exists());
    assert_eq!(std::fs::read_dir(outside.path()).unwrap().count(), 0);
}

#[cfg(unix)]
#[tokio::test]
async fn test_stor_through_link_inside_root() {
    let tmp = server_root();
    std::os::unix::fs::symlink(tmp.path().join("sub"), tmp.path().join("shortcut")).unwrap();
    let mut client = Client::logged_in(tmp.path()).await;

    assert_eq!(
        client.send("STOR NEW shortcut/up.txt").await,
        "+File does not exist, will create new file"
    );
    assert_eq!(client.send("SIZE 2").await, "+ok, waiting for file");
    client.stream.write_all(b"up").await.unwrap();
    assert_eq!(client.read_reply().await, "+Saved shortcut/up.txt");
    assert_eq!(
        std::fs::read_to_string(tmp.path().join("sub").join("up.txt")).unwrap(),
        "up"
    );
}

#[tokio::test]
async fn test_overlong_file_names() {
    let tmp = server_root();
    let overlong = "a".repeat(300);
    let mut client = Client::logged_in(tmp.path()).await;

    assert_eq!(
        client.send(&format!("RETR {}", overlong)).await,
        "-File path is too long"
    );
    assert_eq!(
        client.send(&format!("KILL {}", overlong)).await,
        "-Not deleted because: path is too long"
    );
    assert_eq!(
        client.send(&format!("STOR NEW {}", overlong)).await,
        "-Couldn't save because path is too long"
    );
    // Nothing is pending after the refusals.
    assert_eq!(client.send("TYPE A").await, "+Using Ascii mode");
}

#[tokio::test]
async fn test_stor_over_longest_allowed_name() {
    let tmp = server_root();
    let name = "b".repeat(250);
    std::fs::write(tmp.path().join(&name), "old").unwrap();
    let mut client = Client::logged_in(tmp.path()).await;

    assert_eq!(
        client.send(&format!("STOR OLD {}", name)).await,
        "+Will write over old file"
    );
    assert_eq!(client.send("SIZE 3").await, "+ok, waiting for file");
    client.stream.write_all(b"new").await.unwrap();
    assert_eq!(client.read_reply().await, format!("+Saved {}", name));
    assert_eq!(std::fs::read(tmp.path().join(&name)).unwrap(), b"new");
}

#[cfg(unix)]
#[tokio::test]
async fn test_retr_unreadable_file() {
    use std::os::unix::fs::PermissionsExt;

    let tmp = server_root();
    let path = tmp.path().join("secret.txt");
    std::fs::write(&path, "secret").unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o000)).unwrap();
    // A privileged user reads it anyway.
    if std::fs::File::open(&path).is_ok() {
        return;
    }

    let mut client = Client::logged_in(tmp.path()).await;
    assert_eq!(
        client.send("RETR secret.txt").await,
        "-Access to the file was denied"
    );
    assert_eq!(client.send("TYPE B").await, "+Using Binary mode");
}
