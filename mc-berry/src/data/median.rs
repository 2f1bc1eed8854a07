//! 时间中值参考卷.

use ndarray::{Array3, ArrayView1, ArrayView4, Axis, Zip};

/// 单个体素时间轴上的中值. 偶数长度取中间两值的均值.
fn median_of(lane: ArrayView1<'_, f32>) -> f32 {
    let mut v: Vec<f32> = lane.iter().copied().collect();
    debug_assert!(!v.is_empty());
    v.sort_unstable_by(f32::total_cmp);

    let n = v.len();
    if n % 2 == 1 {
        v[n / 2]
    } else {
        (v[n / 2 - 1] + v[n / 2]) / 2.0
    }
}

/// 计算 4D 序列的逐体素时间中值卷.
///
/// 未显式给定参考卷时, 引擎以该中值卷为配准目标.
pub fn temporal_median(series: ArrayView4<'_, f32>) -> Array3<f32> {
    let (w, h, z, _) = series.dim();
    let mut med = Array3::<f32>::zeros((w, h, z));

    let zip = Zip::from(&mut med).and(series.lanes(Axis(3)));
    cfg_if::cfg_if! {
        if #[cfg(feature = "rayon")] {
            zip.par_for_each(|m, lane| *m = median_of(lane));
        } else {
            zip.for_each(|m, lane| *m = median_of(lane));
        }
    }
    med
}
