use std::process::ExitCode;

use chrono::Local;
use clap::{ArgAction, Parser, ValueEnum};
use log::LevelFilter;
use vonstack::{
    machine::{Machine, Outcome},
    sink::StdoutSink,
    VmError,
};

/// Programs that can be loaded into the machine.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum Demo {
    /// Multiplies 20 by 3 and prints the result.
    Multiply,
    /// Calls two subroutines, each printing a product, then prints 650.
    Subroutines,
    /// Multiplies using the very last cells of memory as data.
    TopOfMemory,
    /// Calls a subroutine near the end of memory that pushes one value too many.
    DataOverflow,
    /// Never stops, and walks off the end of memory.
    Runaway,
}
impl Demo {
    /// Lays out the program, returning its entry point.
    fn insert(self, machine: &mut Machine<StdoutSink>) -> Result<usize, VmError> {
        let size = machine.memory().size();
        match self {
            Self::Multiply => {
                machine
                    .set_address(0)
                    .insert("PUSH", Some(20))?
                    .insert("PUSH", Some(3))?
                    .insert("MULT", None)?
                    .insert("PRINT", None)?
                    .insert("STOP", None)?;
                Ok(0)
            }
            Self::Subroutines => {
                // Return addresses are pushed by the caller, right before each CALL.
                machine
                    .set_address(0)
                    .insert("PUSH", Some(2))?
                    .insert("CALL", Some(30))?
                    .insert("PUSH", Some(4))?
                    .insert("CALL", Some(60))?
                    .insert("PUSH", Some(650))?
                    .insert("PRINT", None)?
                    .insert("STOP", None)?;
                for (address, factor) in [(30, 11), (60, 12)] {
                    machine
                        .set_address(address)
                        .insert("PUSH", Some(10))?
                        .insert("PUSH", Some(factor))?
                        .insert("MULT", None)?
                        .insert("PUSH", Some(5))?
                        .insert("MULT", None)?
                        .insert("PRINT", None)?
                        .insert("RET", None)?;
                }
                Ok(0)
            }
            Self::TopOfMemory => {
                let entry = size.saturating_sub(7);
                machine
                    .set_address(entry)
                    .insert("PUSH", Some(25))?
                    .insert("PUSH", Some(2))?
                    .insert("MULT", None)?
                    .insert("PRINT", None)?
                    .insert("STOP", None)?;
                Ok(entry)
            }
            Self::DataOverflow => {
                let subroutine = size.saturating_sub(5);
                machine
                    .set_address(0)
                    .insert("PUSH", Some(2))?
                    .insert("CALL", Some(subroutine as i64))?
                    .insert("STOP", None)?
                    .set_address(subroutine)
                    .insert("PUSH", Some(1))?
                    .insert("PUSH", Some(2))?
                    .insert("RET", None)?;
                Ok(0)
            }
            Self::Runaway => {
                machine.set_address(0).insert("PUSH", Some(1))?;
                Ok(0)
            }
        }
    }
}

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Arguments {
    /// Program to run.
    #[arg(value_enum)]
    demo: Demo,
    /// Number of memory cells.
    #[arg(short, long, default_value_t = 100)]
    size: usize,
    /// Starts execution here instead of the program's own entry point.
    #[arg(short, long)]
    entry: Option<usize>,
    /// Gives up after dispatching that many instructions.
    #[arg(long)]
    max_steps: Option<usize>,
    /// Prints every occupied cell once the run is over.
    #[arg(long)]
    dump: bool,
    /// Logs more (-v for insertions and jumps, -vv for every instruction).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

/// How a run ended, when it did not fail.
enum Report {
    Finished(Outcome),
    OutOfSteps(usize),
}

fn run(machine: &mut Machine<StdoutSink>, max_steps: Option<usize>) -> Result<Report, VmError> {
    let Some(max_steps) = max_steps else {
        return machine.execute().map(Report::Finished);
    };
    if !machine.is_ready() {
        return Ok(Report::Finished(Outcome::NoOp));
    }
    let mut executed = 0;
    for step in machine.steps() {
        step?;
        executed += 1;
        if executed >= max_steps {
            return Ok(Report::OutOfSteps(executed));
        }
    }
    Ok(Report::Finished(Outcome::Halted))
}

fn dump(machine: &Machine<StdoutSink>) {
    let memory = machine.memory();
    for (address, cell) in memory.occupied() {
        println!("{address:>5}  {cell}");
    }
    println!(
        "instruction cursor: {:?}, data cursor: {:?}, boundary: {}",
        memory.instruction_cursor(),
        memory.data_cursor(),
        memory.boundary()
    );
}

fn main() -> ExitCode {
    let args = Arguments::parse();
    env_logger::Builder::new()
        .filter_level(match args.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        })
        .parse_default_env()
        .init();

    if args.size == 0 {
        eprintln!("memory needs at least one cell");
        return ExitCode::FAILURE;
    }

    let mut machine = Machine::new(args.size);
    let entry = match args.demo.insert(&mut machine) {
        Ok(entry) => args.entry.unwrap_or(entry),
        Err(error) => {
            eprintln!("could not load {:?}: {error}", args.demo);
            return ExitCode::FAILURE;
        }
    };
    machine.set_address(entry);

    let started = Local::now();
    let result = run(&mut machine, args.max_steps);
    let elapsed = Local::now() - started;
    log::info!(
        "run started at {} and took {}µs",
        started.format("%H:%M:%S%.3f"),
        elapsed.num_microseconds().unwrap_or(i64::MAX)
    );

    if args.dump {
        dump(&machine);
    }

    match result {
        Ok(Report::Finished(Outcome::Halted)) => ExitCode::SUCCESS,
        Ok(Report::Finished(Outcome::NoOp)) => {
            eprintln!("nothing to execute");
            ExitCode::SUCCESS
        }
        Ok(Report::OutOfSteps(steps)) => {
            eprintln!("gave up after {steps} steps");
            ExitCode::FAILURE
        }
        Err(error) => {
            eprintln!("execution failed: {error}");
            ExitCode::FAILURE
        }
    }
}
