fn main() -> anyhow::Result<()> {
    notes_sidenav::cli::run()
}
