//! 配准质量诊断.

use std::path::Path;

use ndarray::{Array3, ArrayView3, ArrayView4, Axis, Zip};

use crate::data::{self, HeaderAttr, Series4d, Volume3d};
use crate::error::{McError, Result};

/// 计算掩膜加权的平均绝对差诊断卷并写入 `out`.
///
/// 即 `mean_t(|registered(t) - reference| * mask)`, 对配准质量的粗粒度
/// 体检: 残差大的区域在诊断卷上发亮. 纯诊断用途, 任何失败只记 warn,
/// 从不影响运行结果. `out` 已存在时跳过.
pub fn write_absdiff_mean(registered: &Path, reference: &Path, weights: &Path, out: &Path) {
    if out.is_file() {
        return;
    }
    if let Err(e) = compute(registered, reference, weights, out) {
        log::warn!("quality metric skipped: {e}");
    }
}

fn compute(registered: &Path, reference: &Path, weights: &Path, out: &Path) -> Result<()> {
    let series = Series4d::open(registered)?;
    let refv = Volume3d::open(reference)?;
    let mask = Volume3d::open(weights)?;

    let (w, h, z, _) = series.data().dim();
    for (path, vol) in [(reference, &refv), (weights, &mask)] {
        if vol.data().dim() != (w, h, z) {
            return Err(McError::GridMismatch {
                path: path.to_owned(),
                expected: (w, h, z),
                found: vol.data().dim(),
            });
        }
    }

    let diff = absdiff_mean(series.data(), refv.data(), mask.data());
    data::write_volume(out, &diff, refv.header())
}

/// `mean_t(|series(t) - reference| * mask)`.
///
/// # Panics
///
/// 三者空间形状不一致时 panic. 调用方先行核验.
pub(crate) fn absdiff_mean(
    series: ArrayView4<'_, f32>,
    reference: ArrayView3<'_, f32>,
    mask: ArrayView3<'_, f32>,
) -> Array3<f32> {
    let (w, h, z, nt) = series.dim();
    assert_eq!(reference.dim(), (w, h, z));
    assert_eq!(mask.dim(), (w, h, z));
    assert!(nt > 0);

    let mut acc = Array3::<f32>::zeros((w, h, z));
    for t in 0..nt {
        Zip::from(&mut acc)
            .and(series.index_axis(Axis(3), t))
            .and(&reference)
            .and(&mask)
            .for_each(|a, &v, &r, &m| *a += (v - r).abs() * m);
    }
    acc.mapv_inplace(|v| v / nt as f32);
    acc
}
