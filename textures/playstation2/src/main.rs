use std::{
	fs,
	path::{
		Path,
		PathBuf
	}
};

use anyhow::{
	bail,
	Context,
	Result
};

use clap::{
	Parser,
	Subcommand
};

use log::info;

use gsk_archives_playstation2::tm3::Tm3;
use gsk_textures_playstation2::{
	gs::Bpp,
	read_tm2,
	texture_from_rgba8,
	ExportCfg,
	ImportCfg,
	ImportFlag,
	Tm2,
	Variant
};

#[derive(Parser)]
#[command(name = "gsk", about = "PlayStation 2 TIM2/TIM3 textures and TM3 archives")]
struct Cli {
	#[command(subcommand)]
	command: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
	/// Print the container header and one line per picture
	Info {
		file: PathBuf,
		/// Also print every CLUT entry as #rrggbbaa, alpha in the GS range
		#[arg(long)]
		palette: bool,
	},
	/// Decode a picture to raw row-major RGBA8
	Raw {
		file: PathBuf,
		/// Output file, defaults to the input with a .rgba extension
		#[arg(short, long)]
		out: Option<PathBuf>,
		#[arg(short, long, default_value_t = 0)]
		picture: usize,
		/// Keep palette alpha in the GS range (0-128)
		#[arg(long)]
		gs_alpha: bool,
		/// Read TIM2 4-bit pictures two indices per byte
		#[arg(long)]
		unpack_nibbles: bool,
	},
	/// Encode raw row-major RGBA8 into a single picture container
	Encode {
		file: PathBuf,
		#[arg(long)]
		width: usize,
		#[arg(long)]
		height: usize,
		#[arg(short, long)]
		out: PathBuf,
		/// Bits per index: 4 or 8
		#[arg(long, default_value_t = 8)]
		bpp: u8,
		/// Write TIM2 (linear) instead of TIM3 (swizzled)
		#[arg(long)]
		tim2: bool,
	},
	/// TM3 archive operations
	#[command(subcommand)]
	Tm3(Tm3Cmd),
}

#[derive(Subcommand)]
enum Tm3Cmd {
	/// List the entries of an archive
	List {
		file: PathBuf,
	},
	/// Extract every entry into a directory
	Unpack {
		file: PathBuf,
		dir: PathBuf,
	},
	/// Build an archive, naming entries after the file stems
	Pack {
		out: PathBuf,
		#[arg(required = true)]
		files: Vec<PathBuf>,
	},
}

fn main() -> Result<()> {
	env_logger::init();
	let cli = Cli::parse();

	match cli.command {
		Cmd::Info { file, palette } => cmd_info(&file, palette),
		Cmd::Raw { file, out, picture, gs_alpha, unpack_nibbles } => {
			let mut cfg = ImportCfg::default();
			cfg.flags.set(ImportFlag::KEEP_GS_ALPHA, gs_alpha);
			cfg.flags.set(ImportFlag::UNPACK_UNTILED_NIBBLES, unpack_nibbles);

			let out = out.unwrap_or_else(|| file.with_extension("rgba"));
			cmd_raw(&file, &out, picture, &cfg)
		}
		Cmd::Encode { file, width, height, out, bpp, tim2 } => {
			let bpp = match bpp {
				4 => Bpp::Four,
				8 => Bpp::Eight,
				_ => bail!("unsupported bit depth {}, expected 4 or 8", bpp),
			};
			let variant = if tim2 { Variant::Tim2 } else { Variant::Tim3 };

			cmd_encode(&file, width, height, &out, variant, bpp)
		}
		Cmd::Tm3(Tm3Cmd::List { file }) => cmd_tm3_list(&file),
		Cmd::Tm3(Tm3Cmd::Unpack { file, dir }) => cmd_tm3_unpack(&file, &dir),
		Cmd::Tm3(Tm3Cmd::Pack { out, files }) => cmd_tm3_pack(&out, &files),
	}
}

fn cmd_info(file: &Path, palette: bool) -> Result<()> {
	let tm2 = read_tm2(&file.to_string_lossy())
		.with_context(|| format!("reading {}", file.display()))?;

	println!("{:?} version {}, format {}, {} pictures", tm2.variant, tm2.header.format_version,
		tm2.header.format_id, tm2.header.num_pictures);

	for (line, picture) in tm2.summary().iter().zip(tm2.pictures.iter()) {
		println!("  {}", line);

		if palette {
			for (i, c) in picture.clut.iter().enumerate() {
				println!("    {:3} {}", i, c.hex_rgba());
			}
		}
	}

	Ok(())
}

fn cmd_raw(file: &Path, out: &Path, picture: usize, cfg: &ImportCfg) -> Result<()> {
	let tm2 = read_tm2(&file.to_string_lossy())
		.with_context(|| format!("reading {}", file.display()))?;
	let tex = tm2.to_texture(picture, cfg).with_context(|| format!("decoding picture {}", picture))?;

	fs::write(out, tex.to_rgba8()?).with_context(|| format!("writing {}", out.display()))?;
	info!("wrote {}x{} RGBA8 to {}", tex.width, tex.height, out.display());

	Ok(())
}

fn cmd_encode(file: &Path, width: usize, height: usize, out: &Path, variant: Variant, bpp: Bpp) -> Result<()> {
	let rgba = fs::read(file).with_context(|| format!("reading {}", file.display()))?;
	let tex = texture_from_rgba8(width, height, &rgba)?;

	let cfg = ExportCfg {
		bpp: bpp,
		..ExportCfg::default()
	};
	let tm2 = Tm2::from_textures(variant, &[tex], &cfg)?;

	fs::write(out, tm2.to_bytes()?).with_context(|| format!("writing {}", out.display()))?;
	info!("wrote {:?} to {}", variant, out.display());

	Ok(())
}

fn cmd_tm3_list(file: &Path) -> Result<()> {
	let data = fs::read(file).with_context(|| format!("reading {}", file.display()))?;
	let tm3 = Tm3::from_bytes(&data)?;

	for (i, entry) in tm3.entries.iter().enumerate() {
		println!("{:3} {:8} offset {:#010X} size {}", i, entry.name, entry.offset, entry.size);
	}

	Ok(())
}

fn cmd_tm3_unpack(file: &Path, dir: &Path) -> Result<()> {
	let data = fs::read(file).with_context(|| format!("reading {}", file.display()))?;
	let tm3 = Tm3::from_bytes(&data)?;

	fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;

	for (i, entry) in tm3.entries.iter().enumerate() {
		let path = dir.join(entry.file_name(i));
		fs::write(&path, tm3.entry_data(&data, i)?).with_context(|| format!("writing {}", path.display()))?;
		info!("{}/{} {}", i + 1, tm3.entries.len(), path.display());
	}

	Ok(())
}

fn cmd_tm3_pack(out: &Path, files: &[PathBuf]) -> Result<()> {
	let mut payloads = Vec::with_capacity(files.len());

	for path in files {
		let name = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
		let data = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
		payloads.push((name, data));
	}

	let entries: Vec<(&str, &[u8])> = payloads.iter().map(|(n, d)| (n.as_str(), d.as_slice())).collect();
	fs::write(out, Tm3::pack(&entries)?).with_context(|| format!("writing {}", out.display()))?;
	info!("packed {} entries into {}", entries.len(), out.display());

	Ok(())
}
