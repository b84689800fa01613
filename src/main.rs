use std::path::Path;
use std::process;
use virtue_basin::config::Config;
use virtue_basin::evolution::Simulator;
use virtue_basin::export::{write_export_to_json, TemplateExport};

fn main() {
    env_logger::init();
    log::info!("Booting virtue_basin...");

    // 1. Load and Validate Configuration
    let config = match Config::load(Path::new("config.toml")) {
        Ok(c) => c,
        Err(e) => {
            log::error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = config.validate() {
        log::error!("Invalid configuration: {}", e);
        process::exit(1);
    }
    log::info!("Configuration loaded and validated.");

    // 2. Seed the population
    let mut simulator = Simulator::from_config(&config.simulator);
    if let Err(e) =
        simulator.initialize_population(config.run.virtue_names.as_slice(), config.run.n_virtues)
    {
        log::error!("Failed to initialize population: {}", e);
        process::exit(1);
    }

    // 3. Run the Evolution
    log::info!(
        "--- Starting Evolution: {} generations of {} templates ---",
        config.run.generations,
        config.simulator.population_size
    );
    let champion = match simulator.run(config.run.generations, config.run.verbose) {
        Ok(t) => t,
        Err(e) => {
            log::error!("Evolution failed: {}", e);
            process::exit(1);
        }
    };

    let stats = simulator.get_statistics();
    log::info!(
        "--- Evolution Complete: generation {} | best {:.4} | avg {:.4} ---",
        stats.generation,
        stats.best_fitness,
        stats.avg_fitness
    );
    if let Some(best) = simulator.best_template() {
        log::info!("Best fitness seen in any generation: {:.4}", best.fitness);
    }

    println!("\n[Champion] Fitness: {:.4}", champion.fitness);
    for basin in champion.topology().get_basin_list() {
        println!(
            "  - {:<12} strength={:.3} center={:?}",
            basin.name(),
            basin.strength(),
            basin.center()
        );
    }
    for edge in champion.topology().relationships() {
        println!(
            "  {} --{}({:.2})--> {}",
            edge.from, edge.constraint_type, edge.weight, edge.to
        );
    }

    // 4. Export the champion
    if let Some(output_file) = &config.run.output_file {
        let export = TemplateExport::new(&champion, &stats, &config.simulator);
        match write_export_to_json(&export, Path::new(output_file)) {
            Ok(()) => log::info!("Champion exported to '{}'.", output_file),
            Err(e) => {
                log::error!("Failed to export champion: {}", e);
                process::exit(1);
            }
        }
    }
}
