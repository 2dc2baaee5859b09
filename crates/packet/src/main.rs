use packet::runtime::{boot, run};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    boot::init_logging();
    let (config, pipeline) = boot::boot()?;
    run::run(config, pipeline)
}
