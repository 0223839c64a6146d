fn main() {
    magneto_prep::cli::run();
}
