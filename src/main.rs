fn main() -> anyhow::Result<()> {
    poi_tags::cli::run()
}
