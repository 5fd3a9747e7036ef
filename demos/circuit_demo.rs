use gatesim::{ModuleKind, Position, SimError, SimulationConfig, SimulationEngine, Value};
use log::info;

fn main() -> Result<(), SimError> {
    env_logger::init();
    println!("Starting 4-bit counter with trace RAM");

    let engine = SimulationEngine::new(SimulationConfig::default());

    // =========================
    // COUNTER
    // =========================

    let reg = engine.add_module(ModuleKind::Register, Position::new(0.0, 0.0))?;
    let add = engine.add_module(ModuleKind::AddSub, Position::new(120.0, 0.0))?;
    let step = engine.add_module(ModuleKind::Switch, Position::new(0.0, 80.0))?;

    engine.connect(engine.port(reg, "Q")?, engine.port(add, "A")?)?;
    engine.connect(engine.port(step, "Q")?, engine.port(add, "B")?)?;
    engine.connect(engine.port(add, "Q")?, engine.port(reg, "D")?)?;
    engine.set_state(step, Value::new(4, 1))?;

    // =========================
    // TRACE MEMORY
    // =========================

    // The RAM records the counter value at the address it currently holds
    let ram = engine.add_module(ModuleKind::Ram, Position::new(240.0, 0.0))?;
    let fan = engine.add_module(ModuleKind::Fanout, Position::new(60.0, -60.0))?;
    engine.edit(|circuit| -> Result<(), SimError> {
        let reg_q = circuit.port(reg, "Q")?;
        let existing: Vec<_> = circuit
            .links()
            .filter(|link| link.source == reg_q)
            .map(|link| link.id)
            .collect();
        for link in existing {
            circuit.disconnect(link)?;
        }
        circuit.connect(reg_q, circuit.port(fan, "D")?)?;
        circuit.connect(circuit.port(fan, "Q0")?, circuit.port(add, "A")?)?;
        circuit.connect(circuit.port(fan, "Q1")?, circuit.port(ram, "A")?)?;
        circuit.connect(circuit.port(fan, "Q2")?, circuit.port(ram, "D")?)?;
        circuit.set_input(circuit.port(ram, "W")?, Value::from_bool(true))?;
        Ok(())
    })??;

    println!("Running 20 clock edges...\n");
    for _ in 0..20 {
        let report = engine.tick()?;
        let count = engine.current_value(engine.port(reg, "Q")?)?;
        let carry = engine.current_value(engine.port(add, "C")?)?;
        info!(
            "cycle {} evaluated {} module(s) in {} evaluation(s)",
            engine.current_cycle()?,
            report.evaluated.len(),
            report.evaluations
        );
        println!("count = {} (0x{:x}) carry = {}", count, count.bits(), carry);
    }

    let stats = engine.read(|circuit| circuit.connection_stats())?;
    println!(
        "\n{} link(s), {} driven output(s), max fan-out {}",
        stats.links, stats.driven_outputs, stats.max_fan_out
    );

    if let Some(data) = engine.module_data(ram)? {
        println!("RAM contents: {}", data.get("data").unwrap_or(""));
    }

    engine.reset()?;
    println!(
        "After reset: count = {}, cycle = {}",
        engine.current_value(engine.port(reg, "Q")?)?,
        engine.current_cycle()?
    );

    Ok(())
}
