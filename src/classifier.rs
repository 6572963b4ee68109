use crate::error::ClassifyError;
use crate::graph::Graph;
use crate::labels;
use crate::preprocess;
use crate::usb_link::{NcsUsbLink, DEFAULT_BOOT_WAIT};
use log::{debug, info};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

// Layout of the ncappzoo checkout the graph and label files come from.
pub const DEFAULT_GRAPH_SUFFIX: &str = "caffe/GoogLeNet/graph";
pub const DEFAULT_LABELS_SUFFIX: &str = "data/ilsvrc12/synset_words.txt";

pub const DEFAULT_FIRMWARE_PATH: &str = "/usr/local/lib/mvnc/MvNCAPI.mvcmd";

pub const TOP_LABEL_COUNT: usize = 5;

#[derive(Debug, Clone)]
pub struct ClassifyConfig {
    pub graph_path: PathBuf,
    pub labels_path: PathBuf,
    pub firmware_path: PathBuf,
    pub io_timeout: Duration,
}

impl Default for ClassifyConfig {
    fn default() -> Self {
        let zoo = ncappzoo_path();
        Self {
            graph_path: zoo.join(DEFAULT_GRAPH_SUFFIX),
            labels_path: zoo.join(DEFAULT_LABELS_SUFFIX),
            firmware_path: PathBuf::from(DEFAULT_FIRMWARE_PATH),
            io_timeout: Duration::from_secs(10),
        }
    }
}

pub fn ncappzoo_path() -> PathBuf {
    if let Ok(path) = env::var("NCAPPZOO_PATH") {
        return PathBuf::from(path);
    }
    let home = env::var("HOME").unwrap_or_else(|_| ".".to_string());
    Path::new(&home).join("workspace/ncappzoo")
}

// The whole pipeline against the first stick: open (booting firmware if the
// stick is still in boot mode), allocate the graph, push one tensor, read one
// result, rank labels, then tear down graph-first.
pub fn classify(
    config: &ClassifyConfig,
    image_path: &Path,
) -> Result<[String; TOP_LABEL_COUNT], ClassifyError> {
    let label_list = labels::load_labels(&config.labels_path)?;
    debug!("loaded {} labels", label_list.len());

    let blob = fs::read(&config.graph_path)?;
    let tensor = preprocess::load_image_tensor(image_path)?;

    let link = open_runtime_link(config)?;
    let graph = Graph::allocate(&link, &blob)?;
    graph.load_tensor(&tensor)?;
    let scores = graph.get_result()?;
    graph.deallocate()?;

    info!("inference produced {} scores", scores.len());

    let order = labels::top_k_indices(&scores, TOP_LABEL_COUNT);
    Ok(std::array::from_fn(|rank| {
        order
            .get(rank)
            .and_then(|&idx| label_list.get(idx))
            .cloned()
            .unwrap_or_else(|| "Unknown".to_string())
    }))
}

fn open_runtime_link(config: &ClassifyConfig) -> Result<NcsUsbLink, ClassifyError> {
    let mut link = NcsUsbLink::open_first_prefer_runtime(config.io_timeout)?;
    if !link.is_runtime_device() {
        info!(
            "stick is in boot mode, uploading firmware from {}",
            config.firmware_path.display()
        );
        let firmware = fs::read(&config.firmware_path)?;
        link = link.boot_with_firmware(&firmware, DEFAULT_BOOT_WAIT)?;
    }
    link.set_configuration_1()?;
    link.claim_interface0()?;
    Ok(link)
}
