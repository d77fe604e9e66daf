use crate::error::{ComicScraperError, Result};
use crate::models::OutputFormat;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use zip::write::FileOptions;
use zip::CompressionMethod;

/// Packs a chapter directory into a single cbz or pdf file.
pub struct ArchiveAssembler;

impl ArchiveAssembler {
    /// Writes every file under `dir`, ordered by relative path, into
    /// `output`, then removes `dir`. On error `dir` is left untouched.
    pub fn assemble(dir: &Path, output: &Path, format: OutputFormat) -> Result<()> {
        if !dir.is_dir() {
            return Err(ComicScraperError::assembly(format!(
                "{} is not a directory",
                dir.display()
            )));
        }

        let files = collect_files(dir)?;
        if files.is_empty() {
            return Err(ComicScraperError::assembly(format!(
                "{} contains no pages",
                dir.display()
            )));
        }

        info!("Creating {} with {} pages: {:?}", format, files.len(), output);
        match format {
            OutputFormat::Cbz => write_zip(dir, &files, output)?,
            OutputFormat::Pdf => write_pdf(&files, output)?,
        }

        fs::remove_dir_all(dir)?;
        debug!("Removed chapter directory: {:?}", dir);
        Ok(())
    }
}

/// Files below `root`, sorted by their path relative to `root`.
fn collect_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();
            if entry.file_type()?.is_dir() {
                pending.push(path);
            } else {
                files.push(path);
            }
        }
    }
    files.sort();
    Ok(files)
}

fn entry_name(root: &Path, path: &Path) -> Result<String> {
    let relative = path
        .strip_prefix(root)
        .map_err(|e| ComicScraperError::assembly(format!("{}: {}", path.display(), e)))?;
    Ok(relative.to_string_lossy().replace('\\', "/"))
}

fn write_zip(root: &Path, files: &[PathBuf], output: &Path) -> Result<()> {
    let file = File::create(output)?;
    let mut zip = zip::ZipWriter::new(file);
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    for path in files {
        zip.start_file(entry_name(root, path)?, options)?;
        let content = fs::read(path)?;
        zip.write_all(&content)?;
    }

    zip.finish()?;
    Ok(())
}

fn write_pdf(files: &[PathBuf], output: &Path) -> Result<()> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut kids: Vec<Object> = Vec::with_capacity(files.len());
    for path in files {
        let page_id = add_image_page(&mut doc, pages_id, path)?;
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    doc.save(output)?;
    Ok(())
}

/// One page sized to the image, at one point per pixel.
fn add_image_page(doc: &mut Document, pages_id: ObjectId, path: &Path) -> Result<ObjectId> {
    // Page files keep a .jpg name whatever their real format, so sniff it.
    let image = image::io::Reader::open(path)?
        .with_guessed_format()?
        .decode()?
        .to_rgb8();
    let (width, height) = image.dimensions();
    let (width, height) = (i64::from(width), i64::from(height));

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(image.as_raw())?;
    let pixels = encoder.finish()?;

    let image_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width,
            "Height" => height,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => "FlateDecode",
        },
        pixels,
    ));

    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![width.into(), 0.into(), 0.into(), height.into(), 0.into(), 0.into()],
            ),
            Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
            Operation::new("Q", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));

    Ok(doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "MediaBox" => vec![0.into(), 0.into(), width.into(), height.into()],
        "Resources" => dictionary! {
            "XObject" => dictionary! {
                "Im0" => image_id,
            },
        },
    }))
}
