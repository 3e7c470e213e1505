use std::{fs, path::PathBuf, process::Command};

fn write_maze(name: &str, contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("maze-explorer-{}-{name}", std::process::id()));
    fs::write(&path, contents).expect("failed to write maze fixture");
    path
}

fn explore(args: &[&str]) -> (bool, String, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_maze-explorer"))
        .args(args)
        .output()
        .expect("failed to invoke maze-explorer binary");
    (
        output.status.success(),
        String::from_utf8_lossy(&output.stdout).into_owned(),
        String::from_utf8_lossy(&output.stderr).into_owned(),
    )
}

#[test]
fn two_exits_are_counted_and_reported() {
    let maze = write_maze("two-exits.txt", "4 3\n   /\n ***\n   /\n");
    let (success, stdout, _) = explore(&[maze.to_str().expect("utf-8 path"), "--workers", "2"]);

    assert!(success, "exploring a valid maze should succeed");
    assert!(stdout.starts_with("__________Maze__________\n"));
    assert!(stdout.contains("reached the exit at (3, 0) after 3 cells."));
    assert!(stdout.contains("reached the exit at (3, 2) after 5 cells."));
    assert!(stdout
        .trim_end()
        .ends_with("There are 2 different paths leading to the exit."));
    let _ = fs::remove_file(maze);
}

#[test]
fn sealed_maze_reports_no_exit() {
    let maze = write_maze("sealed.txt", "2 2\n *\n**\n");
    let (success, stdout, _) = explore(&[maze.to_str().expect("utf-8 path")]);

    assert!(success);
    assert!(stdout.trim_end().ends_with("No exit was found in the maze."));
    let _ = fs::remove_file(maze);
}

#[test]
fn malformed_maze_fails_with_context() {
    let maze = write_maze("malformed.txt", "three rows\n");
    let (success, _, stderr) = explore(&[maze.to_str().expect("utf-8 path")]);

    assert!(!success, "a malformed header must fail the run");
    assert!(stderr.contains("invalid maze file"));
    let _ = fs::remove_file(maze);
}
