use anyhow::Result;

fn main() -> Result<()> {
    formula_fn_triage::cli::run()
}
