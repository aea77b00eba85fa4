use crate::core::period::period_key;
use crate::core::{round2, round_yen};
use crate::domain::model::{ChannelAnalysis, CropSalesPoint, CropShare, Granularity, SalesRecord};
use std::collections::BTreeMap;

/// 各期間、各作物的銷售額
pub fn aggregate_crop_sales(sales: &[SalesRecord], granularity: Granularity) -> Vec<CropSalesPoint> {
    let mut groups: BTreeMap<String, BTreeMap<String, f64>> = BTreeMap::new();
    for record in sales {
        *groups
            .entry(period_key(&record.date, granularity))
            .or_default()
            .entry(record.crop.clone())
            .or_insert(0.0) += record.total;
    }

    groups
        .into_iter()
        .map(|(period, crops)| CropSalesPoint {
            period,
            crops: crops
                .into_iter()
                .map(|(crop, total)| (crop, round_yen(total)))
                .collect(),
        })
        .collect()
}

#[derive(Default)]
struct ChannelTotals {
    revenue: f64,
    volume: f64,
    count: usize,
}

/// 銷售通路分析，依營收由高到低排序
pub fn analyze_channels(sales: &[SalesRecord]) -> Vec<ChannelAnalysis> {
    let mut channels: BTreeMap<&str, ChannelTotals> = BTreeMap::new();
    for record in sales {
        let totals = channels.entry(record.channel.as_str()).or_default();
        totals.revenue += record.total;
        totals.volume += record.quantity;
        totals.count += 1;
    }

    let total_revenue: f64 = channels.values().map(|c| c.revenue).sum();

    let mut result: Vec<ChannelAnalysis> = channels
        .into_iter()
        .map(|(channel, totals)| ChannelAnalysis {
            channel: channel.to_string(),
            revenue: round_yen(totals.revenue),
            volume: round2(totals.volume),
            average_price: if totals.volume != 0.0 {
                round_yen(totals.revenue / totals.volume)
            } else {
                0
            },
            percentage: share(totals.revenue, total_revenue),
            record_count: totals.count,
        })
        .collect();

    result.sort_by(|a, b| b.revenue.cmp(&a.revenue));
    result
}

/// 作物別營收構成比，依營收由高到低排序
pub fn crop_composition(sales: &[SalesRecord]) -> Vec<CropShare> {
    let mut crops: BTreeMap<&str, f64> = BTreeMap::new();
    for record in sales {
        *crops.entry(record.crop.as_str()).or_insert(0.0) += record.total;
    }

    let total_revenue: f64 = crops.values().sum();

    let mut result: Vec<CropShare> = crops
        .into_iter()
        .map(|(crop, revenue)| CropShare {
            crop: crop.to_string(),
            revenue: round_yen(revenue),
            percentage: share(revenue, total_revenue),
        })
        .collect();

    result.sort_by(|a, b| b.revenue.cmp(&a.revenue));
    result
}

fn share(part: f64, total: f64) -> f64 {
    if total > 0.0 {
        round2(part / total * 100.0)
    } else {
        0.0
    }
}
