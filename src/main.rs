fn main() {
    meetpoint::cli::run();
}
