use std::{
    fs::{
        self,
        File,
    },
    io::{
        self,
        BufReader,
        BufWriter,
    },
    path::{
        Path,
        PathBuf,
    },
    time::Duration,
};

use liblzma::read::XzDecoder;
use tar::Archive;
use tracing::info;
use vibrato::Dictionary;
use zstd::stream::copy_decode;

use crate::{
    core::{
        http::{
            download_to_file,
            http_client,
        },
        NplusError,
    },
    persistence::get_app_data_dir,
};

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(600);

fn get_tokenizer_dict_dir() -> PathBuf {
    get_app_data_dir().join("dictionaries").join("tokenizer")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DictType {
    Unidic,
    Ipadic,
}

impl DictType {
    fn url(&self) -> &str {
        match self {
            DictType::Unidic => {
                "https://github.com/daac-tools/vibrato/releases/download/v0.5.0/bccwj-suw+unidic-cwj-3_1_1.tar.xz"
            }
            DictType::Ipadic => {
                "https://github.com/daac-tools/vibrato/releases/download/v0.5.0/ipadic-mecab-2_7_0.tar.xz"
            }
        }
    }

    fn folder_name(&self) -> &str {
        match self {
            DictType::Unidic => "bccwj-suw+unidic-cwj-3_1_1",
            DictType::Ipadic => "ipadic-mecab-2_7_0",
        }
    }

    /// Feature column holding the dictionary form.
    pub fn lemma_index(&self) -> usize {
        match self {
            DictType::Unidic => 10,
            DictType::Ipadic => 6,
        }
    }

    /// Feature column 0 values that mark punctuation and whitespace.
    pub fn symbol_tags(&self) -> &'static [&'static str] {
        match self {
            DictType::Unidic => &["補助記号", "空白"],
            DictType::Ipadic => &["記号"],
        }
    }
}

fn cleanup_files(folder_path: &Path, keep_files: &[&str]) -> Result<(), NplusError> {
    let keep_paths: Vec<PathBuf> = keep_files.iter().map(|f| folder_path.join(f)).collect();

    for entry in fs::read_dir(folder_path).map_err(|e| {
        NplusError::Custom(format!("Failed to read directory during cleanup: {}", e))
    })? {
        let path = entry?.path();
        if keep_paths.contains(&path) {
            continue;
        }

        if path.is_dir() {
            fs::remove_dir_all(&path)?;
        } else {
            fs::remove_file(&path)?;
        }
    }

    info!(retained = ?keep_files, "cleaned up tokenizer model files");
    Ok(())
}

/// Returns the path of `system.dic`, downloading and unpacking the release
/// archive (xz → tar → zstd) into the data directory on first use.
pub fn ensure_dictionary(dict_type: DictType) -> Result<PathBuf, NplusError> {
    let folder_name = dict_type.folder_name();
    let dict_dir = get_tokenizer_dict_dir();
    let extract_path = dict_dir.join(folder_name);
    let final_dic_path = extract_path.join("system.dic");

    if final_dic_path.exists() {
        info!(path = %final_dic_path.display(), "tokenizer model already downloaded");
        return Ok(final_dic_path);
    }

    fs::create_dir_all(&dict_dir).map_err(|e| {
        NplusError::Custom(format!("Failed to create dictionary directory {:?}: {}", dict_dir, e))
    })?;

    // Partial leftovers from an interrupted attempt
    let download_path = dict_dir.join(format!("{}.tar.xz", folder_name));
    let tar_path = dict_dir.join(format!("{}.tar", folder_name));
    fs::remove_file(&download_path).ok();
    fs::remove_file(&tar_path).ok();
    fs::remove_dir_all(&extract_path).ok();

    info!(url = dict_type.url(), "downloading tokenizer model");
    let client = http_client(DOWNLOAD_TIMEOUT)?;
    download_to_file(&client, dict_type.url(), &download_path)?;

    if download_path.metadata()?.len() == 0 {
        return Err(NplusError::Custom(format!(
            "Downloaded file {:?} is empty. Check your internet connection.",
            download_path
        )));
    }

    info!("extracting tokenizer model");
    let tar_xz_file = File::open(&download_path)?;
    let mut tar_file = File::create(&tar_path)?;
    let mut xz_decoder = XzDecoder::new(BufReader::new(tar_xz_file));
    io::copy(&mut xz_decoder, &mut tar_file).map_err(|e| {
        NplusError::Custom(format!("Failed to decompress XZ to TAR: {}. Possible corrupt download.", e))
    })?;

    let mut archive = Archive::new(BufReader::new(File::open(&tar_path)?));
    archive.unpack(&extract_path).map_err(|e| {
        NplusError::Custom(format!("Failed to unpack TAR to {:?}: {}.", extract_path, e))
    })?;

    let zst_path = extract_path.join(folder_name).join("system.dic.zst");
    if !zst_path.exists() {
        return Err(NplusError::Custom(format!(
            "ZST file not found at {:?} after extraction.",
            zst_path
        )));
    }

    let zst_file = File::open(&zst_path)?;
    let dic_file = File::create(&final_dic_path)?;
    copy_decode(BufReader::new(zst_file), BufWriter::new(dic_file)).map_err(|e| {
        NplusError::Custom(format!("Failed to decompress ZST to {:?}: {}.", final_dic_path, e))
    })?;

    let inner_path = extract_path.join(folder_name);
    for notice in ["BSD", "NOTICE"] {
        if inner_path.join(notice).exists() {
            fs::rename(inner_path.join(notice), extract_path.join(notice))?;
        }
    }

    cleanup_files(&extract_path, &["system.dic", "BSD", "NOTICE"])?;
    fs::remove_file(&download_path)?;
    fs::remove_file(&tar_path)?;

    info!(path = %final_dic_path.display(), "tokenizer model ready");
    Ok(final_dic_path)
}

pub fn load_dictionary(path: &Path) -> Result<Dictionary, NplusError> {
    let reader = BufReader::new(File::open(path)?);
    let dict = Dictionary::read(reader)?;
    Ok(dict)
}
