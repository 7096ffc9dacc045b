fn main() -> anyhow::Result<()> {
    cindex::run()
}
