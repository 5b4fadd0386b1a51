//! Version command implementation.

use medgate_abac::{
    DEFAULT_MAX_ATTRIBUTES, DEFAULT_MAX_POLICY_BYTES, MAX_EXPR_NODES, MAX_NESTING_DEPTH,
};

const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn run() {
    println!("medgate {VERSION}");
    println!();
    println!("Attribute-based access control for hospital records.");
    println!();
    println!("Engine limits (defaults):");
    println!("  Attributes per request: {DEFAULT_MAX_ATTRIBUTES}");
    println!("  Policy size:            {DEFAULT_MAX_POLICY_BYTES} bytes");
    println!("  Nesting depth:          {MAX_NESTING_DEPTH}");
    println!("  Expression nodes:       {MAX_EXPR_NODES}");
    println!();
    println!("Build info:");
    println!("  Target:       {}", std::env::consts::ARCH);
    println!("  OS:           {}", std::env::consts::OS);
}
