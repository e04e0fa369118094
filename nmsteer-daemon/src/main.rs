fn main() -> anyhow::Result<()> {
    nmsteer_daemon::run()
}
