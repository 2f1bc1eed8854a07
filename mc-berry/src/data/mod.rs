//! NIfTI 序列 / 卷数据结构.
//!
//! 引擎的大部分工作以文件路径为单位交给外部工具; 只有元信息读取、
//! 时间中值参考卷与质量诊断三处在进程内接触体数据.

use std::path::Path;

use ndarray::{Array3, Array4, ArrayView3, ArrayView4, Axis, Ix3, Ix4};
use nifti::writer::WriterOptions;
use nifti::{IntoNdArray, NiftiHeader, NiftiObject, ReaderOptions};

use crate::error::{McError, Result};
use crate::Shape3;

mod median;

pub use median::temporal_median;

/// `NiftiHeader` 是栈上大对象, 移动该对象的开销很可观.
/// 因此我们将其分配到堆上.
type BoxedHeader = Box<NiftiHeader>;

/// 4D 序列 / 3D 卷 NIfTI header 的共用属性.
pub trait HeaderAttr {
    /// 获取 header 部分.
    fn header(&self) -> &NiftiHeader;

    /// header 中记录的维度个数.
    #[inline]
    fn ndim(&self) -> usize {
        self.header().dim[0] as usize
    }

    /// 空间形状 `(W, H, Z)`. 体素个数.
    #[inline]
    fn shape3(&self) -> Shape3 {
        let [_, w, h, z, ..] = self.header().dim;
        (w as usize, h as usize, z as usize)
    }

    /// Z 方向切片个数.
    #[inline]
    fn nz(&self) -> usize {
        self.shape3().2
    }

    /// 时间点 (frame) 个数. 3D 卷为 1.
    #[inline]
    fn nt(&self) -> usize {
        let h = self.header();
        if h.dim[0] >= 4 {
            h.dim[4] as usize
        } else {
            1
        }
    }

    /// 时间采样间隔 TR, 以秒为单位.
    #[inline]
    fn tr(&self) -> f64 {
        self.header().pixdim[4] as f64
    }
}

/// 仅含 header 的序列元信息. 打开时不读取体数据.
///
/// frame 数、Z 层数与 TR 全部取自 header; 引擎不以文件缺失探测序列边界.
#[derive(Debug, Clone)]
pub struct SeriesMeta {
    header: BoxedHeader,
}

impl HeaderAttr for SeriesMeta {
    #[inline]
    fn header(&self) -> &NiftiHeader {
        &self.header
    }
}

impl SeriesMeta {
    /// 读取 `path` 的 NIfTI header. 文件不存在时返回 `MissingInput`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(McError::MissingInput(path.to_owned()));
        }
        let header = NiftiHeader::from_file(path)?;

        Ok(Self {
            header: Box::new(header),
        })
    }

    /// 核验 `other` 的空间网格与本序列一致, 不一致时返回 `GridMismatch`.
    pub fn check_grid<P: AsRef<Path>>(&self, other: P) -> Result<()> {
        let other = other.as_ref();
        let meta = SeriesMeta::open(other)?;
        if meta.shape3() != self.shape3() {
            return Err(McError::GridMismatch {
                path: other.to_owned(),
                expected: self.shape3(),
                found: meta.shape3(),
            });
        }
        Ok(())
    }
}

/// 完整载入的 3D 卷, 体素以 `f32` 保存.
#[derive(Debug, Clone)]
pub struct Volume3d {
    header: BoxedHeader,
    data: Array3<f32>,
}

impl HeaderAttr for Volume3d {
    #[inline]
    fn header(&self) -> &NiftiHeader {
        &self.header
    }
}

impl Volume3d {
    /// 打开 nii / nii.gz 格式的 3D 卷.
    ///
    /// 末尾长度为 1 的时间轴会被压掉, 因此存成 `(W, H, Z, 1)` 的卷也可接受.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let obj = ReaderOptions::new().read_file(path)?;
        let header = Box::new(obj.header().clone());

        let mut data = obj.into_volume().into_ndarray::<f32>()?;
        if data.ndim() == 4 && data.shape()[3] == 1 {
            data = data.index_axis_move(Axis(3), 0);
        }
        let found = data.ndim();
        let data = data
            .into_dimensionality::<Ix3>()
            .map_err(|_| McError::WrongDimensionality {
                path: path.to_owned(),
                expected: 3,
                found,
            })?;

        Ok(Self { header, data })
    }

    /// 获得体数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView3<'_, f32> {
        self.data.view()
    }
}

/// 完整载入的 4D 时间序列, 体素以 `f32` 保存, 轴序 `(W, H, Z, t)`.
#[derive(Debug, Clone)]
pub struct Series4d {
    header: BoxedHeader,
    data: Array4<f32>,
}

impl HeaderAttr for Series4d {
    #[inline]
    fn header(&self) -> &NiftiHeader {
        &self.header
    }
}

impl Series4d {
    /// 打开 nii / nii.gz 格式的 4D 序列. 非 4D 输入返回 `WrongDimensionality`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let obj = ReaderOptions::new().read_file(path)?;
        let header = Box::new(obj.header().clone());

        let data = obj.into_volume().into_ndarray::<f32>()?;
        let found = data.ndim();
        let data = data
            .into_dimensionality::<Ix4>()
            .map_err(|_| McError::WrongDimensionality {
                path: path.to_owned(),
                expected: 4,
                found,
            })?;

        Ok(Self { header, data })
    }

    /// 获得体数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView4<'_, f32> {
        self.data.view()
    }

    /// 第 `t` 个 frame 的视图.
    ///
    /// 当 `t` 越界时 panic.
    #[inline]
    pub fn frame(&self, t: usize) -> ArrayView3<'_, f32> {
        self.data.index_axis(Axis(3), t)
    }
}

/// 以 `reference` 的空间信息把 3D 卷写入 `path`.
///
/// 路径以 `.nii.gz` 结尾时自动压缩.
pub fn write_volume<P: AsRef<Path>>(
    path: P,
    data: &Array3<f32>,
    reference: &NiftiHeader,
) -> Result<()> {
    let (w, h, z) = data.dim();
    let mut header = reference.clone();
    header.dim = [3, w as u16, h as u16, z as u16, 1, 1, 1, 1];

    WriterOptions::new(path.as_ref())
        .reference_header(&header)
        .write_nifti(data)?;
    Ok(())
}
