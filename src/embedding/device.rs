use candle_core::Device;
use tracing::info;

#[cfg(any(feature = "metal", feature = "cuda"))]
use tracing::warn;

use super::reranker::RerankerError;

/// Selects the compute device based on enabled features (falls back to CPU).
pub fn select_device() -> Result<Device, RerankerError> {
    #[cfg(any(feature = "metal", feature = "cuda"))]
    let mut failures: Vec<String> = Vec::new();

    #[cfg(not(any(feature = "metal", feature = "cuda")))]
    let failures: Vec<String> = Vec::new();

    #[cfg(feature = "metal")]
    {
        match Device::new_metal(0) {
            Ok(device) => {
                info!("Using Metal GPU acceleration for reranker");
                return Ok(device);
            }
            Err(e) => {
                let msg = e.to_string();
                if cfg!(feature = "cuda") {
                    warn!(error = %msg, "Metal device unavailable, trying CUDA");
                } else {
                    warn!(error = %msg, "Metal device unavailable");
                }
                failures.push(format!("metal failed: {msg}"));
            }
        }
    }

    #[cfg(feature = "cuda")]
    {
        match Device::new_cuda(0) {
            Ok(device) => {
                info!("Using CUDA GPU acceleration for reranker");
                return Ok(device);
            }
            Err(e) => {
                let msg = e.to_string();
                warn!(error = %msg, "CUDA device unavailable");
                failures.push(format!("cuda failed: {msg}"));
            }
        }
    }

    if failures.is_empty() {
        info!("No GPU backend compiled, using CPU device");
    } else {
        #[cfg(any(feature = "metal", feature = "cuda"))]
        warn!(reason = %failures.join("; "), "Falling back to CPU device");
    }
    Ok(Device::Cpu)
}
