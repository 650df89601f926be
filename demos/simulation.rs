//! Walk a small community through every economic operation.
//!
//! ```bash
//! RUST_LOG=picsy_core=debug cargo run --example simulation
//! ```

use picsy_core::{
    Community, CompanyCharter, Founder, MemberId, Outflow, PicsyError, StateView, Transaction,
};
use tracing_subscriber::EnvFilter;

fn print_state(title: &str, view: &StateView) {
    println!("\n== {title} ==");
    println!("{:>4} {:<8} {:<8} {:<7} {:>8} {:>8}", "id", "name", "kind", "status", "c", "power");
    for (i, m) in view.members.iter().enumerate() {
        println!(
            "{:>4} {:<8} {:<8} {:<7} {:>8.4} {:>8.4}",
            m.id.to_string(),
            m.name,
            m.kind.label(),
            m.status.label(),
            view.contributions[i],
            view.purchasing_power[i],
        );
    }
    for row in view.matrix.rows() {
        let cells: Vec<String> = row.iter().map(|x| format!("{x:.3}")).collect();
        println!("     [{}]", cells.join(", "));
    }
}

fn main() -> Result<(), PicsyError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let a = MemberId::new(1);
    let b = MemberId::new(2);
    let c = MemberId::new(3);

    let community = Community::default();
    print_state("seed", &community.get_state());

    let view = community.transact(Transaction { buyer: a, seller: b, price: 0.1 })?;
    print_state("A buys from B for 0.1", &view);

    let view = community.transact(Transaction { buyer: c, seller: a, price: 0.05 })?;
    print_state("C buys from A for 0.05", &view);

    let view = community.add_member("Dana")?;
    let dana = view.members[view.members.len() - 1].id;
    print_state("Dana joins", &view);

    let view = community.create_company(&CompanyCharter {
        name: "Co-op".into(),
        budget: 0.2,
        founders: vec![Founder { member: a, invest: 0.1 }, Founder { member: b, invest: 0.15 }],
        outflows: vec![Outflow { member: c, weight: 1.0 }, Outflow { member: dana, weight: 2.0 }],
    })?;
    let company = view.members[view.members.len() - 1].id;
    print_state("A and B found Co-op", &view);

    let decomposition = community.decompose_company(company)?;
    let people = decomposition
        .people
        .iter()
        .map(|m| m.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    println!("\n== Co-op folded out over [{people}] ==");
    for row in decomposition.matrix.rows() {
        let cells: Vec<String> = row.iter().map(|x| format!("{x:.3}")).collect();
        println!("     [{}]", cells.join(", "));
    }

    community.ghost(c)?;
    let view = community.recover(0.1)?;
    print_state("C ghosted, recovery at 0.1", &view);

    match community.transact(Transaction { buyer: b, seller: a, price: 5.0 }) {
        Ok(_) => println!("\nunexpected: oversized purchase went through"),
        Err(err) => println!("\nrejected as expected: {err}"),
    }

    Ok(())
}
