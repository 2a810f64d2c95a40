fn main() {
    if let Err(err) = task_client::run() {
        eprintln!("task-client: {err}");
        std::process::exit(1);
    }
}
