#[cfg(target_arch = "wasm32")]
fn main() {}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    if let Err(err) = native::run() {
        eprintln!("nx_cli error: {err}");
        std::process::exit(1);
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::fs;
    use std::path::{Path, PathBuf};

    use nxinstr_engine::diagnostics::Diagnostics;
    use nxinstr_engine::instrument::{ExportOptions, ReferenceSelection, StructuralPolicy, export};
    use nxinstr_engine::load_instrument;

    const USAGE: &str = r"nx_cli (nxinstr-engine)

USAGE:
  nx_cli export <instrument.json> [options]
  nx_cli components <instrument.json>

OPTIONS (export):
  --out <path>         Write the target tree to this file instead of stdout
  --reference <name>   Center the scene on this component
  --category <name>    Center on the component of this category (default: samples)
  --absolute           Keep absolute positions
  --namespace <path>   Prefix for run-time parameter links
  --skip-broken        Leave out components with a broken chain instead of aborting
  --allow-dict         Accept non-NX metadata records as JSON fields
  --no-provenance      Do not record source statements
  --overwrite          Overwrite an existing output file
  -h, --help           Show this help
";

    pub fn run() -> Result<(), String> {
        let args: Vec<String> = std::env::args().skip(1).collect();
        let mut args = Args::new(args);

        let Some(command) = args.next() else {
            print_usage();
            return Ok(());
        };

        match command.as_str() {
            "export" => run_export(&mut args),
            "components" => {
                let path = args.value("components")?;
                list_components(Path::new(&path))
            }
            "-h" | "--help" | "help" => {
                print_usage();
                Ok(())
            }
            other => Err(format!("unknown command `{other}`\n\n{USAGE}")),
        }
    }

    fn print_usage() {
        print!("{USAGE}");
    }

    fn run_export(args: &mut Args) -> Result<(), String> {
        let mut input: Option<PathBuf> = None;
        let mut out: Option<PathBuf> = None;
        let mut overwrite = false;
        let mut options = ExportOptions::default();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--out" => out = Some(PathBuf::from(args.value("--out")?)),
                "--reference" => options.reference = ReferenceSelection::Named(args.value("--reference")?),
                "--category" => options.reference = ReferenceSelection::Category(args.value("--category")?),
                "--absolute" => options.reference = ReferenceSelection::Absolute,
                "--namespace" => options.runtime_namespace = args.value("--namespace")?,
                "--skip-broken" => options.structural_policy = StructuralPolicy::Skip,
                "--allow-dict" => options.only_nx = false,
                "--no-provenance" => options.provenance = false,
                "--overwrite" => overwrite = true,
                "-h" | "--help" => {
                    print_usage();
                    return Ok(());
                }
                flag if flag.starts_with('-') => return Err(format!("unknown option {flag}")),
                path => {
                    if input.replace(PathBuf::from(path)).is_some() {
                        return Err("only one instrument file can be exported at a time".to_owned());
                    }
                }
            }
        }

        let input = input.ok_or_else(|| format!("missing instrument file\n\n{USAGE}"))?;
        let text = read_text_file(&input)?;
        let instrument = load_instrument(&text).map_err(|e| format!("{}: {e}", input.display()))?;
        let export = export(&instrument, &options).map_err(|e| e.to_string())?;
        report(&export.diagnostics);

        let json = export.to_json().map_err(|e| format!("serialize tree: {e}"))?;
        match out {
            Some(path) => write_text_file(&path, &json, overwrite),
            None => {
                println!("{json}");
                Ok(())
            }
        }
    }

    fn list_components(path: &Path) -> Result<(), String> {
        let text = read_text_file(path)?;
        let instrument = load_instrument(&text).map_err(|e| format!("{}: {e}", path.display()))?;
        for component in &instrument.components {
            println!("{component}");
        }
        Ok(())
    }

    fn report(diagnostics: &Diagnostics) {
        for diagnostic in diagnostics {
            eprintln!("{diagnostic}");
        }
        if !diagnostics.is_empty() {
            eprintln!(
                "{} diagnostics ({} warnings)",
                diagnostics.len(),
                diagnostics.warnings()
            );
        }
    }

    fn read_text_file(path: &Path) -> Result<String, String> {
        fs::read_to_string(path).map_err(|e| format!("read {}: {e}", path.display()))
    }

    fn write_text_file(path: &Path, text: &str, overwrite: bool) -> Result<(), String> {
        if path.exists() && !overwrite {
            return Err(format!(
                "refusing to overwrite existing file {} (use --overwrite)",
                path.display()
            ));
        }
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| format!("create dir {}: {e}", parent.display()))?;
        }
        fs::write(path, text).map_err(|e| format!("write {}: {e}", path.display()))
    }

    struct Args {
        args: Vec<String>,
        pos: usize,
    }

    impl Args {
        fn new(args: Vec<String>) -> Self {
            Self { args, pos: 0 }
        }

        fn next(&mut self) -> Option<String> {
            let arg = self.args.get(self.pos)?.clone();
            self.pos += 1;
            Some(arg)
        }

        fn value(&mut self, flag: &str) -> Result<String, String> {
            self.next().ok_or_else(|| format!("missing value for {flag}"))
        }
    }
}
